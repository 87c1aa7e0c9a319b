//! Remote HTTP API consumed by the sync coordinator.
//!
//! Every response is wrapped in an [`ApiResponse`] envelope. A non-2xx status
//! or `success == false` is a rejection; anything that fails before a status
//! arrives is a transport error.

mod client;
mod dto;
#[cfg(test)]
pub(crate) mod fake;

pub use client::ApiClient;
pub use dto::{AnimalDto, KpiDto, VaccineDto, VaccineTypeDto};

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Envelope returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwraps the payload, turning an application-level failure into
    /// [`ApiError::Rejected`].
    pub fn into_result(self, status: u16) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected {
                status,
                message: self
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode("response envelope has no payload".to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Remote API not configured. Set api.base_url in the config file or HERD_API_URL.")]
    NotConfigured,
    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Operations the sync coordinator needs from the remote system.
pub trait RemoteApi: Send + Sync {
    fn list_animals(&self) -> impl Future<Output = Result<Vec<AnimalDto>, ApiError>> + Send;

    fn create_animal(
        &self,
        animal: &AnimalDto,
    ) -> impl Future<Output = Result<AnimalDto, ApiError>> + Send;

    fn update_animal(
        &self,
        server_id: i64,
        animal: &AnimalDto,
    ) -> impl Future<Output = Result<AnimalDto, ApiError>> + Send;

    fn list_vaccines(&self) -> impl Future<Output = Result<Vec<VaccineDto>, ApiError>> + Send;

    fn create_vaccine(
        &self,
        vaccine: &VaccineDto,
    ) -> impl Future<Output = Result<VaccineDto, ApiError>> + Send;

    fn update_vaccine(
        &self,
        server_id: i64,
        vaccine: &VaccineDto,
    ) -> impl Future<Output = Result<VaccineDto, ApiError>> + Send;

    fn fetch_kpis(&self) -> impl Future<Output = Result<KpiDto, ApiError>> + Send;

    fn list_vaccine_types(
        &self,
    ) -> impl Future<Output = Result<Vec<VaccineTypeDto>, ApiError>> + Send;

    fn upload_vaccine_types(
        &self,
        types: &[VaccineTypeDto],
    ) -> impl Future<Output = Result<Vec<VaccineTypeDto>, ApiError>> + Send;
}

impl<T: RemoteApi> RemoteApi for Arc<T> {
    async fn list_animals(&self) -> Result<Vec<AnimalDto>, ApiError> {
        (**self).list_animals().await
    }

    async fn create_animal(&self, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        (**self).create_animal(animal).await
    }

    async fn update_animal(&self, server_id: i64, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        (**self).update_animal(server_id, animal).await
    }

    async fn list_vaccines(&self) -> Result<Vec<VaccineDto>, ApiError> {
        (**self).list_vaccines().await
    }

    async fn create_vaccine(&self, vaccine: &VaccineDto) -> Result<VaccineDto, ApiError> {
        (**self).create_vaccine(vaccine).await
    }

    async fn update_vaccine(
        &self,
        server_id: i64,
        vaccine: &VaccineDto,
    ) -> Result<VaccineDto, ApiError> {
        (**self).update_vaccine(server_id, vaccine).await
    }

    async fn fetch_kpis(&self) -> Result<KpiDto, ApiError> {
        (**self).fetch_kpis().await
    }

    async fn list_vaccine_types(&self) -> Result<Vec<VaccineTypeDto>, ApiError> {
        (**self).list_vaccine_types().await
    }

    async fn upload_vaccine_types(
        &self,
        types: &[VaccineTypeDto],
    ) -> Result<Vec<VaccineTypeDto>, ApiError> {
        (**self).upload_vaccine_types(types).await
    }
}
