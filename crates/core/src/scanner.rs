//! Lists media roots and yields the files worth reconciling.

use crate::classifier;
use crate::config::{MediaRoot, RootLayout, ScanConfig};
use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub filename: String,
    pub size: i64,
    /// Parent directory name for files found under a `shows` root.
    pub show_title: Option<String>,
}

/// Extension, exclusion and hidden-file policy shared by every root.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extensions: HashSet<String>,
    excludes: GlobSet,
    include_hidden: bool,
}

impl FileFilter {
    pub fn new(extensions: &[String], excludes: &[String], include_hidden: bool) -> anyhow::Result<Self> {
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Ok(Self {
            extensions,
            excludes: build_globset(excludes)?,
            include_hidden,
        })
    }

    pub fn from_config(cfg: &ScanConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.extensions, &cfg.exclude, cfg.include_hidden)
    }

    pub fn has_recognized_extension(&self, filename: &str) -> bool {
        classifier::extension(filename)
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn accepts(&self, path: &Path, filename: &str) -> bool {
        if self.excludes.is_match(path) {
            return false;
        }
        self.has_recognized_extension(filename)
    }
}

/// Lists one root according to its layout, in file-name order.
///
/// A root that cannot be read is an error; unreadable entries inside it are
/// skipped.
pub fn list_root(root: &MediaRoot, filter: &FileFilter) -> anyhow::Result<Vec<DiscoveredFile>> {
    let root_path = PathBuf::from(&root.path);
    let meta = fs::metadata(&root_path).with_context(|| format!("stat media root {}", root.path))?;
    if !meta.is_dir() {
        anyhow::bail!("media root {} is not a directory", root.path);
    }
    fs::read_dir(&root_path).with_context(|| format!("open media root {}", root.path))?;

    let max_depth = match root.layout {
        RootLayout::Flat => 1,
        RootLayout::Shows => 2,
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(&root_path)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || filter.include_hidden || !is_hidden(e.path()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(root = %root.path, error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        // Show roots only hold episodes inside per-show directories.
        if root.layout == RootLayout::Shows && entry.depth() != 2 {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filter.accepts(entry.path(), &filename) {
            debug!(path = %entry.path().display(), "ignored");
            continue;
        }

        // Follows symlinks so a linked file reports its target's size.
        let meta = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "stat failed, skipping");
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let show_title = match root.layout {
            RootLayout::Shows => entry
                .path()
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            RootLayout::Flat => None,
        };

        files.push(DiscoveredFile {
            path: entry.path().to_path_buf(),
            filename,
            size: meta.len() as i64,
            show_title,
        });
    }

    Ok(files)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid exclude pattern {pat:?}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
