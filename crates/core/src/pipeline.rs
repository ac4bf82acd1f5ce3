use crate::config::AppConfig;
use crate::enrichment::Enricher;
use crate::reconciler::{Reconciler, ScanSummary};
use crate::scanner::FileFilter;
use crate::store::{RecordStore, SqliteStore};
use crate::sweeper;
use anyhow::Context;
use chrono::Utc;
use providers::noop::NoopProvider;
use providers::tmdb::{TmdbConfig, TmdbProvider};
use providers::MetadataProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs one full scan: reconcile every root, then sweep and backfill.
///
/// Only an unusable database or scan configuration is an error; everything
/// that goes wrong per root or per file ends up in the summary.
pub async fn run_scan(config: &AppConfig) -> anyhow::Result<ScanSummary> {
    let store = SqliteStore::open(&config.database.path).await?;
    let filter = FileFilter::from_config(&config.scan).context("scan filter")?;
    let enricher = Enricher::new(
        build_provider(config),
        Duration::from_secs(config.metadata.timeout_secs.max(1)),
    );
    run_scan_with(config, &store, &enricher, &filter).await
}

pub async fn run_scan_with(
    config: &AppConfig,
    store: &dyn RecordStore,
    enricher: &Enricher,
    filter: &FileFilter,
) -> anyhow::Result<ScanSummary> {
    let started_at = Utc::now();
    info!(
        roots = config.scan.roots.len(),
        provider = enricher.provider_name(),
        "starting scan"
    );

    let reconciler = Reconciler::new(store, enricher, filter);
    let mut summary = reconciler.reconcile(&config.scan.roots).await;

    // With no readable root every record would look stale.
    if config.scan.roots.is_empty() {
        warn!("no media roots configured, skipping staleness sweep");
    } else if summary.roots_scanned == 0 {
        warn!(
            skipped = summary.roots_skipped,
            "no media root could be read, skipping staleness sweep"
        );
    } else {
        match sweeper::sweep(store, started_at).await {
            Ok(removed) => summary.swept = removed,
            Err(err) => error!(error = %err, "staleness sweep failed; stale records remain until next scan"),
        }
    }
    if let Err(err) = sweeper::backfill_created_at(store, started_at).await {
        warn!(error = %err, "timestamp backfill failed");
    }

    info!(
        seen = summary.files_seen,
        classified = summary.classified,
        refreshed = summary.refreshed,
        failed = summary.failed,
        swept = summary.swept,
        "scan complete"
    );
    Ok(summary)
}

pub fn build_provider(config: &AppConfig) -> Arc<dyn MetadataProvider> {
    let meta = &config.metadata;
    match meta.provider.to_lowercase().as_str() {
        "tmdb" => {
            let api_key = meta
                .api_key
                .clone()
                .or_else(|| std::env::var("TMDB_API_KEY").ok())
                .unwrap_or_default();
            match TmdbProvider::new(TmdbConfig {
                api_key,
                base_url: meta.base_url.clone(),
                image_base_url: meta.image_base_url.clone(),
                language: meta.language.clone(),
                timeout: Duration::from_secs(meta.timeout_secs.max(1)),
            }) {
                Ok(provider) => Arc::new(provider),
                Err(err) => {
                    warn!(error = %err, "tmdb unavailable, movies will be catalogued as video");
                    Arc::new(NoopProvider)
                }
            }
        }
        "none" | "" => Arc::new(NoopProvider),
        other => {
            warn!(provider = other, "unknown metadata provider, enrichment disabled");
            Arc::new(NoopProvider)
        }
    }
}
