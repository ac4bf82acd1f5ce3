//! The Movie Database (TMDB) JSON API client.

use crate::{Candidate, MetadataProvider, MovieDetails, ProviderError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct TmdbProvider {
    client: Client,
    cfg: Arc<TmdbConfig>,
}

impl TmdbProvider {
    pub fn new(cfg: TmdbConfig) -> Result<Self, ProviderError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ProviderError::Config("tmdb api key is empty".into()));
        }
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, "tmdb request");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.cfg.api_key.as_str()),
                ("language", self.cfg.language.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.cfg.image_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: u64,
    title: Option<String>,
}

#[derive(Deserialize)]
struct MovieResponse {
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    poster_path: Option<String>,
    runtime: Option<i32>,
}

#[derive(Deserialize)]
struct Genre {
    name: String,
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search(&self, title: &str) -> Result<Vec<Candidate>, ProviderError> {
        let resp: SearchResponse = self.get("/search/movie", &[("query", title)]).await?;
        Ok(resp
            .results
            .into_iter()
            .map(|r| Candidate {
                link: format!("/movie/{}", r.id),
                title: r.title,
            })
            .collect())
    }

    async fn fetch_detail(&self, candidate: &Candidate) -> Result<MovieDetails, ProviderError> {
        let movie: MovieResponse = self.get(&candidate.link, &[]).await?;
        Ok(MovieDetails {
            description: movie.overview.unwrap_or_default().trim().to_string(),
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
            poster: movie.poster_path.map(|p| self.poster_url(&p)),
            runtime_minutes: movie.runtime.filter(|r| *r > 0),
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
