use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::observability;
use crate::store::MemoryStore;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Compact once the journal has grown by `threshold` records.
/// Returns whether a compaction ran.
pub async fn compact_if_needed(store: &MemoryStore, threshold: u64) -> bool {
    let appends = store.appends_since_compact().await;
    if appends < threshold.max(1) {
        return false;
    }
    match store.compact().await {
        Ok(()) => {
            metrics::counter!(observability::JOURNAL_COMPACTIONS_TOTAL).increment(1);
            info!("compacted journal after {appends} appends");
            true
        }
        Err(e) => {
            warn!("journal compaction failed: {e}");
            false
        }
    }
}

/// Background task that keeps the journal from growing without bound.
pub async fn run_compactor(store: Arc<MemoryStore>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        compact_if_needed(&store, threshold).await;
    }
}
