use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::SyncError;
use super::merge::merge_prefer_local;
use crate::api::{AnimalDto, RemoteApi, VaccineDto, VaccineTypeDto};
use crate::db::{AnimalRepository, ReplaceStats, VaccineRepository, VaccineTypeRepository};
use crate::loaded::Loaded;
use crate::models::{Animal, ParentRef, Vaccine, VaccineType};
use crate::network::Connectivity;

/// How long a successful cycle keeps the cache fresh for `refresh_animals`.
const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Observable phase of the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Idle,
    Syncing,
    Synced { at: DateTime<Utc> },
    Failed { message: String },
}

/// Outcome of one push phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Records created remotely that adopted a server key.
    pub created: usize,
    /// Records overwritten remotely under their existing server key.
    pub updated: usize,
    /// Records the server rejected or that could not be sent. They stay
    /// pending for the next cycle.
    pub failed: usize,
    /// Records not sent yet because a dependency has no server key.
    pub skipped: usize,
}

impl PushReport {
    pub fn pushed(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub animals_pushed: PushReport,
    pub vaccines_pushed: PushReport,
    pub animals_pulled: ReplaceStats,
    pub vaccines_pulled: ReplaceStats,
    /// Size of the merged vaccine catalog.
    pub vaccine_types: usize,
}

enum Pushed {
    Created,
    Updated,
}

/// Releases the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reconciles the local cache with the remote API.
///
/// Only one operation runs at a time; a call made while another is in flight
/// fails with [`SyncError::AlreadyRunning`] instead of interleaving phases.
pub struct SyncCoordinator<R, C> {
    animals: AnimalRepository,
    vaccines: VaccineRepository,
    vaccine_types: VaccineTypeRepository,
    remote: R,
    connectivity: C,
    in_flight: AtomicBool,
    state: watch::Sender<SyncState>,
    last_success: Mutex<Option<Instant>>,
    stale_after: Duration,
}

impl<R: RemoteApi, C: Connectivity> SyncCoordinator<R, C> {
    pub fn new(pool: SqlitePool, remote: R, connectivity: C) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            animals: AnimalRepository::new(pool.clone()),
            vaccines: VaccineRepository::new(pool.clone()),
            vaccine_types: VaccineTypeRepository::new(pool),
            remote,
            connectivity,
            in_flight: AtomicBool::new(false),
            state,
            last_success: Mutex::new(None),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    fn begin(&self) -> Result<InFlight<'_>, SyncError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::AlreadyRunning)?;
        Ok(InFlight(&self.in_flight))
    }

    async fn ensure_online(&self) -> Result<(), SyncError> {
        let status = self.connectivity.status().await;
        if !status.is_online() {
            debug!(?status, "Skipping remote calls");
            return Err(SyncError::NoNetwork);
        }
        Ok(())
    }

    /// Runs a full cycle: push animals, push vaccines, pull animals, pull
    /// vaccines, then merge the vaccine catalog.
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.begin()?;
        self.state.send_replace(SyncState::Syncing);

        match self.run_cycle().await {
            Ok(report) => {
                *self
                    .last_success
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
                self.state.send_replace(SyncState::Synced { at: Utc::now() });
                info!(
                    animals_pushed = report.animals_pushed.pushed(),
                    vaccines_pushed = report.vaccines_pushed.pushed(),
                    animals_pulled = report.animals_pulled.applied,
                    vaccines_pulled = report.vaccines_pulled.applied,
                    "Sync complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.state.send_replace(SyncState::Failed {
                    message: e.to_string(),
                });
                warn!(error = %e, "Sync failed");
                Err(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        self.ensure_online().await?;

        let animals_pushed = self.upload_animals().await?;
        let vaccines_pushed = self.upload_vaccines().await?;
        let animals_pulled = self.download_animals().await?;
        let vaccines_pulled = self.download_vaccines().await?;
        let vaccine_types = self.merge_vaccine_types().await?;

        Ok(SyncReport {
            animals_pushed,
            vaccines_pushed,
            animals_pulled,
            vaccines_pulled,
            vaccine_types,
        })
    }

    pub async fn push_animals(&self) -> Result<PushReport, SyncError> {
        let _guard = self.begin()?;
        self.ensure_online().await?;
        self.upload_animals().await
    }

    pub async fn push_vaccines(&self) -> Result<PushReport, SyncError> {
        let _guard = self.begin()?;
        self.ensure_online().await?;
        self.upload_vaccines().await
    }

    pub async fn pull_animals(&self) -> Result<ReplaceStats, SyncError> {
        let _guard = self.begin()?;
        self.ensure_online().await?;
        self.download_animals().await
    }

    pub async fn pull_vaccines(&self) -> Result<ReplaceStats, SyncError> {
        let _guard = self.begin()?;
        self.ensure_online().await?;
        self.download_vaccines().await
    }

    pub async fn sync_vaccine_types(&self) -> Result<usize, SyncError> {
        let _guard = self.begin()?;
        self.ensure_online().await?;
        self.merge_vaccine_types().await
    }

    /// Active animals for display. The cache is served as is while fresh;
    /// otherwise a cycle runs first and, if it fails, the cache is returned
    /// flagged offline.
    pub async fn refresh_animals(&self, force: bool) -> Result<Loaded<Vec<Animal>>, sqlx::Error> {
        let cached = self.animals.list_active().await?;
        if !force && !cached.is_empty() && !self.is_stale() {
            return Ok(Loaded::live(cached));
        }

        match self.sync_all().await {
            Ok(_) => Ok(Loaded::live(self.animals.list_active().await?)),
            Err(SyncError::AlreadyRunning) => Ok(Loaded::live(cached)),
            Err(SyncError::Store(e)) => Err(e),
            Err(e) => Ok(Loaded::cached(cached, e.to_string())),
        }
    }

    fn is_stale(&self) -> bool {
        let last = *self
            .last_success
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.map_or(true, |at| at.elapsed() >= self.stale_after)
    }

    async fn upload_animals(&self) -> Result<PushReport, SyncError> {
        let pending = self.animals.list_unsynced().await?;
        let mut report = PushReport::default();

        // Children wait until their parents hold a server key; each pass
        // retries the ones held back by a parent uploaded in the pass before.
        let mut queue: Vec<&Animal> = pending.iter().collect();
        loop {
            let mut waiting = Vec::new();
            let mut progressed = false;

            for animal in queue {
                if self.awaits_parent(animal).await? {
                    waiting.push(animal);
                    continue;
                }
                progressed = true;
                match self.upload_animal(animal).await {
                    Ok(Pushed::Created) => report.created += 1,
                    Ok(Pushed::Updated) => report.updated += 1,
                    Err(SyncError::Store(e)) => return Err(SyncError::Store(e)),
                    Err(e) => {
                        warn!(tag = %animal.tag, id = %animal.id, error = %e, "Failed to push animal");
                        report.failed += 1;
                    }
                }
            }

            if waiting.is_empty() || !progressed {
                for animal in &waiting {
                    debug!(tag = %animal.tag, "Parent not uploaded yet, animal deferred");
                }
                report.skipped += waiting.len();
                break;
            }
            queue = waiting;
        }

        info!(
            pending = pending.len(),
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "Pushed animals"
        );
        Ok(report)
    }

    async fn upload_animal(&self, animal: &Animal) -> Result<Pushed, SyncError> {
        let mother_id = self.parent_server_id(animal.mother.as_ref()).await?;
        let father_id = self.parent_server_id(animal.father.as_ref()).await?;
        let dto = AnimalDto::from_animal(animal, mother_id, father_id);

        let (server_id, pushed) = match animal.server_id.filter(|id| *id > 0) {
            Some(server_id) => {
                self.remote.update_animal(server_id, &dto).await?;
                (server_id, Pushed::Updated)
            }
            None => {
                let created = self.remote.create_animal(&dto).await?;
                let server_id = created.server_id().ok_or_else(|| {
                    SyncError::Transport("create response carries no server id".to_string())
                })?;
                (server_id, Pushed::Created)
            }
        };

        if !self
            .animals
            .mark_synced(animal.id, server_id, animal.updated_at)
            .await?
        {
            debug!(tag = %animal.tag, "Animal edited during upload, left pending");
        }
        Ok(pushed)
    }

    /// Whether a parent of `animal` exists locally but has no server key.
    async fn awaits_parent(&self, animal: &Animal) -> Result<bool, sqlx::Error> {
        for parent in [animal.mother.as_ref(), animal.father.as_ref()].into_iter().flatten() {
            let missing_key = self
                .animals
                .get_by_id(parent.animal_id)
                .await?
                .is_some_and(|p| p.server_id.is_none());
            if missing_key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn parent_server_id(&self, parent: Option<&ParentRef>) -> Result<Option<i64>, sqlx::Error> {
        let Some(parent) = parent else {
            return Ok(None);
        };
        Ok(self
            .animals
            .get_by_id(parent.animal_id)
            .await?
            .and_then(|p| p.server_id))
    }

    async fn upload_vaccines(&self) -> Result<PushReport, SyncError> {
        let pending = self.vaccines.list_unsynced().await?;
        let mut report = PushReport::default();

        for vaccine in &pending {
            let animal_server_id = self
                .animals
                .get_by_id(vaccine.animal_id)
                .await?
                .and_then(|a| a.server_id);
            let Some(animal_server_id) = animal_server_id else {
                debug!(vaccine = %vaccine.name, "Animal not uploaded yet, vaccine deferred");
                report.skipped += 1;
                continue;
            };

            match self.upload_vaccine(vaccine, animal_server_id).await {
                Ok(Pushed::Created) => report.created += 1,
                Ok(Pushed::Updated) => report.updated += 1,
                Err(SyncError::Store(e)) => return Err(SyncError::Store(e)),
                Err(e) => {
                    warn!(vaccine = %vaccine.name, id = %vaccine.id, error = %e, "Failed to push vaccine");
                    report.failed += 1;
                }
            }
        }

        info!(
            pending = pending.len(),
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "Pushed vaccines"
        );
        Ok(report)
    }

    async fn upload_vaccine(&self, vaccine: &Vaccine, animal_server_id: i64) -> Result<Pushed, SyncError> {
        let dto = VaccineDto::from_vaccine(vaccine, animal_server_id);

        let (server_id, pushed) = match vaccine.server_id.filter(|id| *id > 0) {
            Some(server_id) => {
                self.remote.update_vaccine(server_id, &dto).await?;
                (server_id, Pushed::Updated)
            }
            None => {
                let created = self.remote.create_vaccine(&dto).await?;
                let server_id = created.server_id().ok_or_else(|| {
                    SyncError::Transport("create response carries no server id".to_string())
                })?;
                (server_id, Pushed::Created)
            }
        };

        if !self
            .vaccines
            .mark_synced(vaccine.id, server_id, vaccine.updated_at)
            .await?
        {
            debug!(vaccine = %vaccine.name, "Vaccine edited during upload, left pending");
        }
        Ok(pushed)
    }

    async fn download_animals(&self) -> Result<ReplaceStats, SyncError> {
        let remote = self.remote.list_animals().await?;
        let local = self.animals.list_all().await?;

        let by_server: HashMap<i64, Uuid> = local
            .iter()
            .filter_map(|a| a.server_id.map(|sid| (sid, a.id)))
            .collect();

        let mut assigned = Vec::with_capacity(remote.len());
        for dto in remote {
            let Some(server_id) = dto.server_id() else {
                warn!(tag = %dto.tag, "Remote animal has no id, ignored");
                continue;
            };
            let local_id = by_server
                .get(&server_id)
                .copied()
                .unwrap_or_else(Uuid::new_v4);
            assigned.push((local_id, dto));
        }

        // Parents resolve against the post-pull population: remote records
        // by server id, then any animal by tag.
        let by_remote_id: HashMap<i64, ParentRef> = assigned
            .iter()
            .filter_map(|(id, dto)| dto.server_id().map(|sid| (sid, ParentRef::new(*id, dto.tag.clone()))))
            .collect();
        let mut by_tag: HashMap<String, ParentRef> = local
            .iter()
            .filter(|a| !a.synchronized)
            .map(|a| (a.tag.to_lowercase(), ParentRef::of(a)))
            .collect();
        for (id, dto) in &assigned {
            if dto.active || !by_tag.contains_key(&dto.tag.to_lowercase()) {
                by_tag.insert(dto.tag.to_lowercase(), ParentRef::new(*id, dto.tag.clone()));
            }
        }

        let resolve = |server_id: Option<i64>, tag: Option<&str>| -> Option<ParentRef> {
            if let Some(parent) = server_id.and_then(|sid| by_remote_id.get(&sid)) {
                return Some(parent.clone());
            }
            let tag = tag.map(str::trim).filter(|t| !t.is_empty())?;
            by_tag.get(&tag.to_lowercase()).cloned()
        };

        let records: Vec<Animal> = assigned
            .into_iter()
            .map(|(local_id, dto)| {
                let mother = resolve(dto.mother_id, dto.mother_tag.as_deref());
                let father = resolve(dto.father_id, dto.father_tag.as_deref());
                dto.into_animal(local_id, mother, father)
            })
            .collect();

        let stats = self.animals.replace_synced(&records).await?;
        info!(
            remote = records.len(),
            applied = stats.applied,
            kept_local = stats.kept_local,
            removed = stats.removed,
            "Pulled animals"
        );
        Ok(stats)
    }

    async fn download_vaccines(&self) -> Result<ReplaceStats, SyncError> {
        let remote = self.remote.list_vaccines().await?;

        let animals: HashMap<i64, Uuid> = self
            .animals
            .list_all()
            .await?
            .into_iter()
            .filter_map(|a| a.server_id.map(|sid| (sid, a.id)))
            .collect();
        let by_server: HashMap<i64, Uuid> = self
            .vaccines
            .list_all()
            .await?
            .into_iter()
            .filter_map(|v| v.server_id.map(|sid| (sid, v.id)))
            .collect();

        let mut records = Vec::with_capacity(remote.len());
        for dto in remote {
            let Some(server_id) = dto.server_id() else {
                warn!(vaccine = %dto.name, "Remote vaccine has no id, ignored");
                continue;
            };
            let Some(animal_id) = animals.get(&dto.animal_id).copied() else {
                warn!(vaccine = %dto.name, animal = dto.animal_id, "Remote vaccine references unknown animal, ignored");
                continue;
            };
            let local_id = by_server
                .get(&server_id)
                .copied()
                .unwrap_or_else(Uuid::new_v4);
            records.push(dto.into_vaccine(local_id, animal_id));
        }

        let stats = self.vaccines.replace_synced(&records).await?;
        info!(
            remote = records.len(),
            applied = stats.applied,
            kept_local = stats.kept_local,
            removed = stats.removed,
            "Pulled vaccines"
        );
        Ok(stats)
    }

    async fn merge_vaccine_types(&self) -> Result<usize, SyncError> {
        let remote: Vec<VaccineType> = self
            .remote
            .list_vaccine_types()
            .await?
            .into_iter()
            .map(|dto| VaccineType {
                name: dto.name,
                synchronized: true,
            })
            .filter(|t| !t.key().is_empty())
            .collect();
        let local = self.vaccine_types.list().await?;

        let merged = merge_prefer_local(remote, local, VaccineType::key);
        let payload: Vec<VaccineTypeDto> = merged.iter().map(VaccineTypeDto::from).collect();

        let stored: Vec<VaccineType> = self
            .remote
            .upload_vaccine_types(&payload)
            .await?
            .into_iter()
            .map(|dto| VaccineType::new(dto.name))
            .collect();
        self.vaccine_types.save_synced(&stored).await?;

        info!(types = merged.len(), "Merged vaccine catalog");
        Ok(merged.len())
    }
}
