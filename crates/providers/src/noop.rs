use crate::{Candidate, MetadataProvider, MovieDetails, ProviderError};

/// Provider used when no metadata source is configured; nothing is ever found.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl MetadataProvider for NoopProvider {
    async fn search(&self, _title: &str) -> Result<Vec<Candidate>, ProviderError> {
        Ok(Vec::new())
    }

    async fn fetch_detail(&self, candidate: &Candidate) -> Result<MovieDetails, ProviderError> {
        Err(ProviderError::RequestFailed(format!(
            "no metadata provider configured for {}",
            candidate.link
        )))
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
