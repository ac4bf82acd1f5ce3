//! Brings the catalog in line with what the media roots currently hold.
//!
//! Roots are processed one at a time, files one at a time. Every listed file
//! gets its record touched so the post-scan sweep can tell present files from
//! vanished ones. Records that already carry a type are never reclassified.

use crate::classifier::{self, Classification};
use crate::config::MediaRoot;
use crate::enrichment::Enricher;
use crate::models::{MediaKey, MediaRecord, MediaType};
use crate::scanner::{self, DiscoveredFile, FileFilter};
use crate::store::RecordStore;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub roots_scanned: usize,
    pub roots_skipped: usize,
    pub files_seen: usize,
    pub created: usize,
    pub classified: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub swept: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Already typed; only size and timestamp were refreshed.
    Refreshed,
    Classified { media_type: MediaType, created: bool },
}

pub struct Reconciler<'a> {
    store: &'a dyn RecordStore,
    enricher: &'a Enricher,
    filter: &'a FileFilter,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn RecordStore, enricher: &'a Enricher, filter: &'a FileFilter) -> Self {
        Self {
            store,
            enricher,
            filter,
        }
    }

    pub async fn reconcile(&self, roots: &[MediaRoot]) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for root in roots {
            let files = match scanner::list_root(root, self.filter) {
                Ok(files) => files,
                Err(err) => {
                    warn!(root = %root.path, error = %err, "skipping media root");
                    summary.roots_skipped += 1;
                    continue;
                }
            };
            info!(root = %root.path, files = files.len(), "reconciling media root");
            summary.roots_scanned += 1;

            for file in &files {
                summary.files_seen += 1;
                match self.reconcile_file(file).await {
                    Ok(FileOutcome::Refreshed) => summary.refreshed += 1,
                    Ok(FileOutcome::Classified { created, .. }) => {
                        summary.classified += 1;
                        if created {
                            summary.created += 1;
                        }
                    }
                    Err(err) => {
                        warn!(path = %file.path.display(), error = %err, "failed to record file");
                        summary.failed += 1;
                    }
                }
            }
        }
        summary
    }

    pub async fn reconcile_file(&self, file: &DiscoveredFile) -> anyhow::Result<FileOutcome> {
        let key = MediaKey {
            path: file.path.to_string_lossy().into_owned(),
            filename: file.filename.clone(),
        };
        let (mut record, created) = self.store.find_or_create(&key).await?;
        record.size = file.size;

        if record.is_classified() {
            self.store.save(&mut record).await?;
            debug!(path = %key.path, "refreshed");
            return Ok(FileOutcome::Refreshed);
        }

        // Untyped records left by an interrupted scan are classified here too.
        let media_type = self.classify_into(&mut record, file).await;
        self.store.save(&mut record).await?;
        debug!(path = %key.path, media_type = %media_type, "classified");
        Ok(FileOutcome::Classified {
            media_type,
            created,
        })
    }

    async fn classify_into(&self, record: &mut MediaRecord, file: &DiscoveredFile) -> MediaType {
        let media_type = match classifier::classify(&file.filename) {
            Classification::Audio => MediaType::Audio,
            Classification::TvShow { season, episode } => {
                record.season = Some(season);
                record.episode = Some(episode);
                record.show_title = file.show_title.clone();
                MediaType::TvShow
            }
            Classification::Feature { title, year } => {
                let details = self.enricher.enrich(&title).await;
                record.title = Some(title);
                record.year = year;
                let media_type = classifier::feature_type(details.as_ref());
                if let (MediaType::Movie, Some(d)) = (media_type, details) {
                    record.genres = (!d.genres.is_empty()).then(|| d.genres_joined());
                    record.description = Some(d.description);
                    record.poster = d.poster;
                    record.runtime_minutes = d.runtime_minutes;
                }
                media_type
            }
        };
        record.media_type = Some(media_type);
        media_type
    }
}
