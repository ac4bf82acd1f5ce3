//! Metadata provider abstractions used to enrich catalog records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod noop;
pub mod tmdb;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

/// A search hit pointing at a provider detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub link: String,
    pub title: Option<String>,
}

/// Descriptive movie metadata resolved from a detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub description: String,
    pub genres: Vec<String>,
    pub poster: Option<String>,
    pub runtime_minutes: Option<i32>,
}

impl MovieDetails {
    /// Genres joined the way they are stored on a record.
    pub fn genres_joined(&self) -> String {
        self.genres.join(", ")
    }
}

#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Candidate detail links for `title`, best match first.
    async fn search(&self, title: &str) -> Result<Vec<Candidate>, ProviderError>;

    async fn fetch_detail(&self, candidate: &Candidate) -> Result<MovieDetails, ProviderError>;

    fn name(&self) -> &'static str;
}
