use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use storage::models::MediaRow;

/// Closed set of catalog types. `Video` is the playable-but-unidentified fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    TvShow,
    Movie,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::TvShow => "tvshow",
            MediaType::Movie => "movie",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "audio" => Ok(MediaType::Audio),
            "tvshow" => Ok(MediaType::TvShow),
            "movie" => Ok(MediaType::Movie),
            "video" => Ok(MediaType::Video),
            other => anyhow::bail!("unknown media type: {other}"),
        }
    }
}

/// Natural key of an active record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaKey {
    pub path: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub id: i64,
    pub media_type: Option<MediaType>,
    pub path: String,
    pub filename: String,
    pub size: i64,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub show_title: Option<String>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub episode_title: Option<String>,
    pub episode_description: Option<String>,
    pub episode_aired: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub genres: Option<String>,
    pub poster: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MediaRecord {
    pub fn is_classified(&self) -> bool {
        self.media_type.is_some()
    }

    /// Stable external URL: `http://{host}/{type}/{id}/{filename}`.
    pub fn media_url(&self, host: &str) -> anyhow::Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&format!("http://{host}/"))
            .with_context(|| format!("invalid host {host:?}"))?;
        let kind = self.media_type.unwrap_or(MediaType::Video);
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("host {host:?} cannot carry a path"))?
            .clear()
            .push(kind.as_str())
            .push(&self.id.to_string())
            .push(&self.filename);
        Ok(url)
    }

    /// Creation time in RFC 1123 form, as feeds expect.
    pub fn pub_date(&self) -> String {
        self.created_at
            .format("%a, %d %b %Y %H:%M:%S UTC")
            .to_string()
    }
}

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_default()
}

impl TryFrom<MediaRow> for MediaRecord {
    type Error = anyhow::Error;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let media_type = match row.media_type.as_deref() {
            None | Some("") => None,
            Some(s) => Some(s.parse()?),
        };
        Ok(MediaRecord {
            id: row.id,
            media_type,
            path: row.path,
            filename: row.filename,
            size: row.size,
            title: row.title,
            year: row.year,
            show_title: row.show_title,
            season: row.season,
            episode: row.episode,
            episode_title: row.episode_title,
            episode_description: row.episode_description,
            episode_aired: row.episode_aired.map(from_millis),
            description: row.description,
            genres: row.genres,
            poster: row.poster,
            runtime_minutes: row.runtime_minutes,
            created_at: from_millis(row.created_at),
            updated_at: from_millis(row.updated_at),
            deleted_at: row.deleted_at.map(from_millis),
        })
    }
}
