//! Filename classification.
//!
//! Checks run in a fixed order and the first match wins: audio extension,
//! then an `S##E##` season/episode marker, then the movie/video title guess.

use crate::models::MediaType;
use providers::MovieDetails;
use regex::{Match, Regex};
use std::sync::LazyLock;

pub const AUDIO_EXTENSIONS: &[&str] = &["aac", "flac", "m4a", "mp3", "ogg", "opus", "wav"];

static SEASON_EPISODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"S([0-9]{2})E([0-9]{2,})").expect("valid regex"));
static YEAR_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([0-9]{4})").expect("valid regex"));
static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]+$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Audio,
    TvShow { season: i32, episode: i32 },
    /// Not yet a movie or a video: that depends on enrichment.
    Feature { title: String, year: Option<i32> },
}

/// Text after the last dot, if any. `".mp3"` has extension `mp3`.
pub fn extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

pub fn is_audio(filename: &str) -> bool {
    extension(filename)
        .map(|ext| {
            let ext = ext.to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub fn classify(filename: &str) -> Classification {
    if is_audio(filename) {
        return Classification::Audio;
    }

    if let Some(caps) = SEASON_EPISODE_RE.captures(filename) {
        return Classification::TvShow {
            season: parse_number(caps.get(1)),
            episode: parse_number(caps.get(2)),
        };
    }

    let (title, year) = guess_title(filename);
    Classification::Feature { title, year }
}

/// Title is everything before the first `.YYYY` token or the final
/// extension, whichever starts earlier, with dots turned into spaces.
pub fn guess_title(filename: &str) -> (String, Option<i32>) {
    let mut cut = filename.len();
    let year_caps = YEAR_TOKEN_RE.captures(filename);
    if let Some(token) = year_caps.as_ref().and_then(|c| c.get(0)) {
        cut = cut.min(token.start());
    }
    if let Some(ext) = EXTENSION_RE.find(filename) {
        cut = cut.min(ext.start());
    }

    let title = filename[..cut].replace('.', " ");
    let year = year_caps.and_then(|c| c.get(1)).map(|m| parse_number(Some(m)));
    (title, year)
}

/// Movie when enrichment produced a description, otherwise generic video.
pub fn feature_type(details: Option<&MovieDetails>) -> MediaType {
    match details {
        Some(d) if !d.description.trim().is_empty() => MediaType::Movie,
        _ => MediaType::Video,
    }
}

fn parse_number(capture: Option<Match<'_>>) -> i32 {
    capture
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
