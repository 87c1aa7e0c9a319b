//! Reference implementation of the remote API.
//!
//! Keeps everything in memory and assigns sequential server ids starting at
//! 1. Used by `herd-server` and by the integration tests; not meant to hold
//! real data.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::{AnimalDto, ApiResponse, KpiDto, VaccineDto, VaccineTypeDto};
use crate::models::DashboardKpis;

#[derive(Debug, Default)]
struct Records {
    animals: BTreeMap<i64, AnimalDto>,
    vaccines: BTreeMap<i64, VaccineDto>,
    vaccine_types: Vec<VaccineTypeDto>,
    last_animal_id: i64,
    last_vaccine_id: i64,
}

/// Shared state behind the router.
#[derive(Clone, Default)]
pub struct ServerState {
    records: Arc<RwLock<Records>>,
    token: Option<Arc<str>>,
}

impl ServerState {
    /// When `token` is set, every `/api` route requires it as a bearer token.
    pub fn new(token: Option<String>) -> Self {
        Self {
            records: Arc::default(),
            token: token.map(Arc::from),
        }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

fn created<T>(data: T) -> Reply<T> {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

fn fail<T>(status: StatusCode, message: impl Into<String>) -> Reply<T> {
    (status, Json(ApiResponse::error(message)))
}

async fn auth_middleware(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.token.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => next.run(request).await,
        Some(_) => fail::<()>(StatusCode::UNAUTHORIZED, "Invalid token").into_response(),
        None => fail::<()>(StatusCode::UNAUTHORIZED, "Authorization header required").into_response(),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_animals(State(state): State<ServerState>) -> Reply<Vec<AnimalDto>> {
    let records = state.records.read().await;
    ok(records.animals.values().cloned().collect())
}

async fn create_animal(
    State(state): State<ServerState>,
    Json(mut animal): Json<AnimalDto>,
) -> Reply<AnimalDto> {
    if animal.tag.trim().is_empty() {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "tag is required");
    }
    let mut records = state.records.write().await;
    records.last_animal_id += 1;
    let id = records.last_animal_id;
    animal.id = Some(id);
    records.animals.insert(id, animal.clone());
    tracing::debug!(id, tag = %animal.tag, "Created animal");
    created(animal)
}

async fn update_animal(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(mut animal): Json<AnimalDto>,
) -> Reply<AnimalDto> {
    let mut records = state.records.write().await;
    if !records.animals.contains_key(&id) {
        return fail(StatusCode::NOT_FOUND, format!("animal {} not found", id));
    }
    animal.id = Some(id);
    records.animals.insert(id, animal.clone());
    ok(animal)
}

async fn list_vaccines(State(state): State<ServerState>) -> Reply<Vec<VaccineDto>> {
    let records = state.records.read().await;
    ok(records.vaccines.values().cloned().collect())
}

async fn create_vaccine(
    State(state): State<ServerState>,
    Json(mut vaccine): Json<VaccineDto>,
) -> Reply<VaccineDto> {
    let mut records = state.records.write().await;
    if !records.animals.contains_key(&vaccine.animal_id) {
        return fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("animal {} not found", vaccine.animal_id),
        );
    }
    records.last_vaccine_id += 1;
    let id = records.last_vaccine_id;
    vaccine.id = Some(id);
    records.vaccines.insert(id, vaccine.clone());
    created(vaccine)
}

async fn update_vaccine(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(mut vaccine): Json<VaccineDto>,
) -> Reply<VaccineDto> {
    let mut records = state.records.write().await;
    if !records.vaccines.contains_key(&id) {
        return fail(StatusCode::NOT_FOUND, format!("vaccine {} not found", id));
    }
    vaccine.id = Some(id);
    records.vaccines.insert(id, vaccine.clone());
    ok(vaccine)
}

async fn kpis(State(state): State<ServerState>) -> Reply<KpiDto> {
    let records = state.records.read().await;
    let kpis = DashboardKpis::tally(
        records
            .animals
            .values()
            .filter(|a| a.active)
            .map(|a| (a.sex, a.weight_kg, a.health_status)),
    );
    ok(KpiDto::from(&kpis))
}

async fn list_vaccine_types(State(state): State<ServerState>) -> Reply<Vec<VaccineTypeDto>> {
    let records = state.records.read().await;
    ok(records.vaccine_types.clone())
}

/// Replaces the catalog, dropping blanks and case-insensitive duplicates.
async fn replace_vaccine_types(
    State(state): State<ServerState>,
    Json(types): Json<Vec<VaccineTypeDto>>,
) -> Reply<Vec<VaccineTypeDto>> {
    let mut seen = HashSet::new();
    let catalog: Vec<VaccineTypeDto> = types
        .into_iter()
        .map(|t| VaccineTypeDto {
            name: t.name.trim().to_string(),
        })
        .filter(|t| !t.name.is_empty() && seen.insert(t.name.to_lowercase()))
        .collect();

    let mut records = state.records.write().await;
    records.vaccine_types = catalog.clone();
    ok(catalog)
}

pub fn router(state: ServerState) -> Router {
    let api = Router::new()
        .route("/api/animals", get(list_animals).post(create_animal))
        .route("/api/animals/{id}", put(update_animal))
        .route("/api/vaccines", get(list_vaccines).post(create_vaccine))
        .route("/api/vaccines/{id}", put(update_vaccine))
        .route("/api/dashboard/kpis", get(kpis))
        .route(
            "/api/vaccine-types",
            get(list_vaccine_types).put(replace_vaccine_types),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}
