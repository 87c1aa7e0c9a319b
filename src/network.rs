//! Connectivity precheck run before any remote call.

use serde::Deserialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;

/// Upper bound for a reachability probe, independent of the API timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reachability as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkStatus {
    /// A route to the internet exists.
    pub internet: bool,
    /// The connection was validated end to end.
    pub validated: bool,
}

impl NetworkStatus {
    pub const ONLINE: Self = Self {
        internet: true,
        validated: true,
    };
    pub const OFFLINE: Self = Self {
        internet: false,
        validated: false,
    };

    pub fn is_online(&self) -> bool {
        self.internet && self.validated
    }
}

pub trait Connectivity: Send + Sync {
    fn status(&self) -> impl Future<Output = NetworkStatus> + Send;
}

impl<T: Connectivity> Connectivity for Arc<T> {
    async fn status(&self) -> NetworkStatus {
        (**self).status().await
    }
}

/// Probes the API's `/health` endpoint.
///
/// Any HTTP answer means the host is reachable; the connection counts as
/// validated only when the endpoint reports `ok`.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    health_url: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl HealthProbe {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Self {
        let timeout = timeout.min(PROBE_TIMEOUT);
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            health_url: base_url.map(|url| format!("{}/health", url.trim_end_matches('/'))),
            http,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.as_deref(), config.timeout())
    }
}

impl Connectivity for HealthProbe {
    async fn status(&self) -> NetworkStatus {
        let Some(url) = &self.health_url else {
            return NetworkStatus::OFFLINE;
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                return NetworkStatus::OFFLINE;
            }
        };

        let validated = response.status().is_success()
            && matches!(response.json::<HealthBody>().await, Ok(body) if body.status == "ok");

        NetworkStatus {
            internet: true,
            validated,
        }
    }
}

/// Connectivity that reports whatever it was last told.
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ManualConnectivity {
    async fn status(&self) -> NetworkStatus {
        if self.online.load(Ordering::SeqCst) {
            NetworkStatus::ONLINE
        } else {
            NetworkStatus::OFFLINE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_requires_both_flags() {
        assert!(NetworkStatus::ONLINE.is_online());
        assert!(!NetworkStatus::OFFLINE.is_online());
        assert!(!NetworkStatus {
            internet: true,
            validated: false
        }
        .is_online());
    }

    #[tokio::test]
    async fn test_unconfigured_probe_is_offline() {
        let probe = HealthProbe::new(None, Duration::from_secs(1));
        assert_eq!(probe.status().await, NetworkStatus::OFFLINE);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_offline() {
        let probe = HealthProbe::new(Some("http://127.0.0.1:9"), Duration::from_secs(1));
        assert!(!probe.status().await.is_online());
    }

    #[tokio::test]
    async fn test_manual_connectivity_toggles() {
        let connectivity = ManualConnectivity::new(false);
        assert!(!connectivity.status().await.is_online());
        connectivity.set_online(true);
        assert!(connectivity.status().await.is_online());
    }
}
