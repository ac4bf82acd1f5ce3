use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw `media` row as stored. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct MediaRow {
    pub id: i64,
    pub media_type: Option<String>,
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
    pub episode_aired: Option<i64>,
    pub description: Option<String>,
    pub genres: Option<String>,
    pub poster: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

pub const MEDIA_COLUMNS: &str = "id, media_type, path, filename, size, title, year, show_title, \
    season, episode, episode_title, episode_description, episode_aired, description, genres, \
    poster, runtime_minutes, created_at, updated_at, deleted_at";
