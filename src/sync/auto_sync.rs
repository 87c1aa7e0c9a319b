use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::coordinator::{SyncCoordinator, SyncReport};
use crate::api::RemoteApi;
use crate::config::SyncConfig;
use crate::network::Connectivity;

/// Runs sync cycles until `shutdown` turns true or its sender is dropped.
///
/// Sleeps `interval` after a successful cycle and `backoff` after a failed
/// one. Returns the number of cycles attempted.
pub async fn run_periodic<R: RemoteApi, C: Connectivity>(
    coordinator: &SyncCoordinator<R, C>,
    interval: Duration,
    backoff: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut cycles = 0;
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        cycles += 1;
        let delay = match coordinator.sync_all().await {
            Ok(_) => interval,
            Err(e) => {
                warn!(error = %e, retry_in = ?backoff, "Background sync failed");
                backoff
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    info!(cycles, "Background sync stopped");
    cycles
}

/// One best-effort cycle for command hooks. Does nothing unless
/// `sync.auto_sync` is enabled; failures are logged and dropped.
pub async fn try_auto_sync<R: RemoteApi, C: Connectivity>(
    config: &SyncConfig,
    coordinator: &SyncCoordinator<R, C>,
) -> Option<SyncReport> {
    if !config.auto_sync {
        return None;
    }

    match coordinator.sync_all().await {
        Ok(report) => Some(report),
        Err(e) => {
            debug!(error = %e, "Auto-sync skipped");
            None
        }
    }
}
