use std::sync::Arc;
use std::time::Duration;

use hub_pool::PoolStore;
use tokio::time::interval;
use tracing::info;

use crate::checker::HealthChecker;

/// Background ticker that re-runs `detect_all` on a fixed interval so the
/// pool self-heals without an admin triggering "detect all" by hand.
pub fn spawn_scheduler(checker: Arc<HealthChecker>, store: Arc<PoolStore>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            info!(target: "hub_health", "scheduled detect_all sweep starting");
            checker.detect_all(&store).await;
            info!(target: "hub_health", "scheduled detect_all sweep finished");
        }
    });
}
