//! Dashboard KPIs with a single-row offline fallback.
//!
//! A successful fetch overwrites the cached snapshot as a whole. When the
//! remote cannot be used the last snapshot is served, and if none was ever
//! cached the figures are computed from the local animals.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::api::RemoteApi;
use crate::db::{AnimalRepository, KpiRepository};
use crate::loaded::Loaded;
use crate::models::DashboardKpis;
use crate::network::Connectivity;
use crate::sync::SyncError;

pub struct DashboardService<R, C> {
    kpis: KpiRepository,
    animals: AnimalRepository,
    remote: R,
    connectivity: C,
}

impl<R: RemoteApi, C: Connectivity> DashboardService<R, C> {
    pub fn new(pool: SqlitePool, remote: R, connectivity: C) -> Self {
        Self {
            kpis: KpiRepository::new(pool.clone()),
            animals: AnimalRepository::new(pool),
            remote,
            connectivity,
        }
    }

    pub async fn load(&self) -> Result<Loaded<DashboardKpis>, sqlx::Error> {
        match self.fetch().await {
            Ok(kpis) => {
                self.kpis.save(&kpis).await?;
                Ok(Loaded::live(kpis))
            }
            Err(SyncError::Store(e)) => Err(e),
            Err(e) => {
                warn!(error = %e, "Serving cached dashboard");
                let cached = cached_snapshot(&self.kpis, &self.animals).await?;
                Ok(Loaded::cached(cached, e.to_string()))
            }
        }
    }

    async fn fetch(&self) -> Result<DashboardKpis, SyncError> {
        if !self.connectivity.status().await.is_online() {
            return Err(SyncError::NoNetwork);
        }
        Ok(self.remote.fetch_kpis().await?.into_kpis())
    }
}

/// Last saved snapshot, or one computed from active animals when nothing
/// has been cached yet.
pub async fn cached_snapshot(
    kpis: &KpiRepository,
    animals: &AnimalRepository,
) -> Result<DashboardKpis, sqlx::Error> {
    if let Some(snapshot) = kpis.load().await? {
        return Ok(snapshot);
    }
    debug!("No cached dashboard, computing from local animals");
    Ok(DashboardKpis::from_animals(&animals.list_active().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeRemote;
    use crate::api::KpiDto;
    use crate::db::init_db;
    use crate::models::{Animal, Category, Sex};
    use crate::network::ManualConnectivity;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct TestContext {
        service: DashboardService<Arc<FakeRemote>, Arc<ManualConnectivity>>,
        remote: Arc<FakeRemote>,
        connectivity: Arc<ManualConnectivity>,
        kpis: KpiRepository,
        animals: AnimalRepository,
        _temp_dir: TempDir,
    }

    async fn setup(online: bool) -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let remote = Arc::new(FakeRemote::new());
        let connectivity = Arc::new(ManualConnectivity::new(online));
        TestContext {
            service: DashboardService::new(pool.clone(), remote.clone(), connectivity.clone()),
            remote,
            connectivity,
            kpis: KpiRepository::new(pool.clone()),
            animals: AnimalRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    fn remote_kpis(total: i64) -> KpiDto {
        KpiDto {
            total_animals: total,
            average_weight: 410.5,
            males: 4,
            females: total - 4,
            in_treatment: 1,
        }
    }

    #[tokio::test]
    async fn test_fresh_fetch_overwrites_cache() {
        let ctx = setup(true).await;
        ctx.remote.state().kpis = Some(remote_kpis(10));
        ctx.service.load().await.unwrap();

        ctx.remote.state().kpis = Some(remote_kpis(12));
        let loaded = ctx.service.load().await.unwrap();
        assert!(!loaded.offline);
        assert_eq!(loaded.data.total_animals, 12);

        let cached = ctx.kpis.load().await.unwrap().unwrap();
        assert_eq!(cached.total_animals, 12);
        assert_eq!(cached.females, 8);
    }

    #[tokio::test]
    async fn test_offline_serves_last_snapshot() {
        let ctx = setup(true).await;
        ctx.remote.state().kpis = Some(remote_kpis(10));
        ctx.service.load().await.unwrap();

        ctx.connectivity.set_online(false);
        let calls = ctx.remote.calls().len();
        let loaded = ctx.service.load().await.unwrap();
        assert!(loaded.offline);
        assert_eq!(loaded.data.total_animals, 10);
        assert_eq!(ctx.remote.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_remote_failure_serves_last_snapshot() {
        let ctx = setup(true).await;
        ctx.remote.state().kpis = Some(remote_kpis(10));
        ctx.service.load().await.unwrap();

        ctx.remote.state().kpis = None;
        let loaded = ctx.service.load().await.unwrap();
        assert!(loaded.offline);
        assert!(loaded.message.unwrap().contains("503"));
        assert_eq!(loaded.data.total_animals, 10);
    }

    #[tokio::test]
    async fn test_empty_cache_computes_locally() {
        let ctx = setup(false).await;
        ctx.animals
            .upsert(&Animal::new("A1", Sex::Female, Category::Cow).with_weight(400.0))
            .await
            .unwrap();
        ctx.animals
            .upsert(&Animal::new("A2", Sex::Male, Category::Bull).with_weight(600.0))
            .await
            .unwrap();

        let loaded = ctx.service.load().await.unwrap();
        assert!(loaded.offline);
        assert_eq!(loaded.data.total_animals, 2);
        assert_eq!(loaded.data.average_weight, 500.0);
        assert_eq!(loaded.data.males, 1);
        assert!(ctx.kpis.load().await.unwrap().is_none());
    }
}
