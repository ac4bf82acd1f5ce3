//! Read-only views of the catalog for the `list` command.

use anyhow::Result;
use mediacat_core::models::{MediaRecord, MediaType};
use mediacat_core::store::SqliteStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MediaView {
    pub id: i64,
    pub media_type: String,
    pub title: String,
    pub filename: String,
    pub url: String,
    pub pub_date: String,
}

impl MediaView {
    pub fn from_record(record: &MediaRecord, host: &str) -> Result<Self> {
        Ok(Self {
            id: record.id,
            media_type: record
                .media_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            title: display_title(record),
            filename: record.filename.clone(),
            url: record.media_url(host)?.to_string(),
            pub_date: record.pub_date(),
        })
    }
}

fn display_title(record: &MediaRecord) -> String {
    match (record.media_type, &record.show_title, &record.title) {
        (Some(MediaType::TvShow), show, _) => {
            let season = record.season.unwrap_or_default();
            let episode = record.episode.unwrap_or_default();
            match show {
                Some(show) => format!("{show} S{season:02}E{episode:02}"),
                None => format!("S{season:02}E{episode:02}"),
            }
        }
        (_, _, Some(title)) if !title.trim().is_empty() => match record.year {
            Some(year) => format!("{} ({year})", title.trim()),
            None => title.trim().to_string(),
        },
        _ => record.filename.clone(),
    }
}

pub async fn list_media(
    store: &SqliteStore,
    media_type: Option<MediaType>,
    host: &str,
) -> Result<Vec<MediaView>> {
    store
        .list(media_type)
        .await?
        .iter()
        .map(|r| MediaView::from_record(r, host))
        .collect()
}

pub fn render_table(views: &[MediaView]) -> String {
    let mut out = String::new();
    for v in views {
        out.push_str(&format!(
            "{:>5}  {:<7}  {:<40}  {}  {}\n",
            v.id, v.media_type, v.title, v.pub_date, v.url
        ));
    }
    out
}
