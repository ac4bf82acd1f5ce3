//! Movie enrichment against a metadata provider.
//!
//! Every failure mode collapses into "not found": the scan never stops
//! because a lookup misbehaved.

use providers::{MetadataProvider, MovieDetails, ProviderError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Enricher {
    provider: Arc<dyn MetadataProvider>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(provider: Arc<dyn MetadataProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Looks `title` up and returns the first candidate's details, if any.
    pub async fn enrich(&self, title: &str) -> Option<MovieDetails> {
        let query = title.trim();
        if query.is_empty() {
            return None;
        }

        match tokio::time::timeout(self.timeout, self.lookup(query)).await {
            Ok(Ok(Some(details))) => {
                debug!(title = query, provider = self.provider.name(), "metadata found");
                Some(details)
            }
            Ok(Ok(None)) => {
                debug!(title = query, provider = self.provider.name(), "no metadata match");
                None
            }
            Ok(Err(err)) => {
                warn!(title = query, provider = self.provider.name(), error = %err, "enrichment failed");
                None
            }
            Err(_) => {
                warn!(
                    title = query,
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "enrichment timed out"
                );
                None
            }
        }
    }

    async fn lookup(&self, title: &str) -> Result<Option<MovieDetails>, ProviderError> {
        let candidates = self.provider.search(title).await?;
        let Some(first) = candidates.first() else {
            return Ok(None);
        };
        let details = self.provider.fetch_detail(first).await?;
        Ok(Some(details))
    }
}
