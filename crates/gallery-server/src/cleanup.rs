use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use gallery_store::LocalBackend;

/// Staging files younger than this may belong to an upload still in flight.
const STAGING_GRACE: Duration = Duration::from_secs(3600);

/// Background task that prunes blobs no catalog row points at.
///
/// These come from uploads that died between staging and publishing, and from
/// deletes whose blob removal failed after the row was already gone.
pub async fn run_cleanup_loop(backend: Arc<LocalBackend>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match backend.prune_orphans(STAGING_GRACE).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} orphaned blobs", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}
