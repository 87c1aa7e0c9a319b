//! In-memory remote used by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::dto::{AnimalDto, KpiDto, VaccineDto, VaccineTypeDto};
use super::{ApiError, RemoteApi};

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub animals: BTreeMap<i64, AnimalDto>,
    pub vaccines: BTreeMap<i64, VaccineDto>,
    pub vaccine_types: Vec<VaccineTypeDto>,
    pub kpis: Option<KpiDto>,
    pub next_id: i64,
    pub calls: Vec<&'static str>,
    /// Tags whose create/update calls are rejected.
    pub reject_tags: HashSet<String>,
    /// When set, every list call fails with a transport error.
    pub unreachable: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FakeRemote {
    state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next created record gets `id`.
    pub fn with_next_id(self, id: i64) -> Self {
        self.state().next_id = id - 1;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with("create") || c.starts_with("update"))
            .count()
    }

    pub fn seed_animal(&self, mut animal: AnimalDto) -> i64 {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        animal.id = Some(id);
        state.animals.insert(id, animal);
        id
    }
}

fn unreachable() -> ApiError {
    ApiError::Transport("connection refused".to_string())
}

impl RemoteApi for FakeRemote {
    async fn list_animals(&self) -> Result<Vec<AnimalDto>, ApiError> {
        let mut state = self.state();
        state.calls.push("list_animals");
        if state.unreachable {
            return Err(unreachable());
        }
        Ok(state.animals.values().cloned().collect())
    }

    async fn create_animal(&self, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        let mut state = self.state();
        state.calls.push("create_animal");
        if state.reject_tags.contains(&animal.tag) {
            return Err(ApiError::Rejected {
                status: 422,
                message: format!("tag {} rejected", animal.tag),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = animal.clone();
        stored.id = Some(id);
        state.animals.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_animal(&self, server_id: i64, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        let mut state = self.state();
        state.calls.push("update_animal");
        if state.reject_tags.contains(&animal.tag) || !state.animals.contains_key(&server_id) {
            return Err(ApiError::Rejected {
                status: 404,
                message: "animal not found".to_string(),
            });
        }
        let mut stored = animal.clone();
        stored.id = Some(server_id);
        state.animals.insert(server_id, stored.clone());
        Ok(stored)
    }

    async fn list_vaccines(&self) -> Result<Vec<VaccineDto>, ApiError> {
        let mut state = self.state();
        state.calls.push("list_vaccines");
        if state.unreachable {
            return Err(unreachable());
        }
        Ok(state.vaccines.values().cloned().collect())
    }

    async fn create_vaccine(&self, vaccine: &VaccineDto) -> Result<VaccineDto, ApiError> {
        let mut state = self.state();
        state.calls.push("create_vaccine");
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = vaccine.clone();
        stored.id = Some(id);
        state.vaccines.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_vaccine(
        &self,
        server_id: i64,
        vaccine: &VaccineDto,
    ) -> Result<VaccineDto, ApiError> {
        let mut state = self.state();
        state.calls.push("update_vaccine");
        let mut stored = vaccine.clone();
        stored.id = Some(server_id);
        state.vaccines.insert(server_id, stored.clone());
        Ok(stored)
    }

    async fn fetch_kpis(&self) -> Result<KpiDto, ApiError> {
        let mut state = self.state();
        state.calls.push("fetch_kpis");
        if state.unreachable {
            return Err(unreachable());
        }
        state.kpis.clone().ok_or_else(|| ApiError::Rejected {
            status: 503,
            message: "kpis unavailable".to_string(),
        })
    }

    async fn list_vaccine_types(&self) -> Result<Vec<VaccineTypeDto>, ApiError> {
        let mut state = self.state();
        state.calls.push("list_vaccine_types");
        if state.unreachable {
            return Err(unreachable());
        }
        Ok(state.vaccine_types.clone())
    }

    async fn upload_vaccine_types(
        &self,
        types: &[VaccineTypeDto],
    ) -> Result<Vec<VaccineTypeDto>, ApiError> {
        let mut state = self.state();
        state.calls.push("upload_vaccine_types");
        state.vaccine_types = types.to_vec();
        Ok(state.vaccine_types.clone())
    }
}
