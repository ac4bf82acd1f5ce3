//! Post-scan staleness sweep and catalog maintenance.

use crate::models::to_millis;
use crate::store::RecordStore;
use chrono::{DateTime, TimeZone, Utc};
use tracing::info;

/// Soft-deletes every active record not touched since `scan_started_at`.
///
/// Only sound once every root has been reconciled: a record is considered
/// present exactly when this scan refreshed its timestamp.
pub async fn sweep(store: &dyn RecordStore, scan_started_at: DateTime<Utc>) -> anyhow::Result<u64> {
    let removed = store.soft_delete_stale(scan_started_at).await?;
    info!(removed, started_at = %scan_started_at, "staleness sweep complete");
    Ok(removed)
}

/// Rows imported with a placeholder creation date get the scan time instead.
pub async fn backfill_created_at(store: &dyn RecordStore, now: DateTime<Utc>) -> anyhow::Result<u64> {
    let cutoff = Utc
        .with_ymd_and_hms(1990, 1, 1, 0, 0, 0)
        .single()
        .map(to_millis)
        .unwrap_or_default();
    let fixed = store
        .exec(&format!(
            "UPDATE media SET created_at = {} WHERE created_at < {}",
            to_millis(now),
            cutoff
        ))
        .await?;
    if fixed > 0 {
        info!(fixed, "backfilled legacy creation timestamps");
    }
    Ok(fixed)
}
