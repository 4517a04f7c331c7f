//! Background staleness sweeper
//!
//! Runs on a fixed interval, independent of query traffic. Each pass
//! delegates to the index and controller, which never hold a lock for
//! longer than a single bucket.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::service::ProximityService;

/// Spawn the sweep loop; abort the handle on shutdown
pub fn spawn_sweeper(service: Arc<ProximityService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let (evicted, expired) = service.sweep_once();
            if evicted > 0 || expired > 0 {
                let stats = service.index().stats();
                tracing::debug!(
                    evicted,
                    expired,
                    users = stats.users,
                    cells = stats.cells,
                    "staleness sweep"
                );
            }
        }
    })
}
