use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::dto::{AnimalDto, KpiDto, VaccineDto, VaccineTypeDto};
use super::{ApiError, ApiResponse, RemoteApi};
use crate::config::ApiConfig;

/// HTTP client for the remote API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// `timeout` applies to connecting and to the whole request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns [`ApiError::NotConfigured`] if no base URL is set.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.clone().ok_or(ApiError::NotConfigured)?;
        let client = Self::new(base_url, config.timeout())?;
        Ok(match &config.token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let envelope = serde_json::from_str::<ApiResponse<T>>(&body);

        if !status.is_success() {
            let message = envelope
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.to_string()
                    } else {
                        body
                    }
                });
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        envelope
            .map_err(|e| ApiError::Decode(e.to_string()))?
            .into_result(status.as_u16())
    }
}

impl RemoteApi for ApiClient {
    async fn list_animals(&self) -> Result<Vec<AnimalDto>, ApiError> {
        self.call(self.request(Method::GET, "/api/animals")).await
    }

    async fn create_animal(&self, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        self.call(self.request(Method::POST, "/api/animals").json(animal))
            .await
    }

    async fn update_animal(&self, server_id: i64, animal: &AnimalDto) -> Result<AnimalDto, ApiError> {
        let path = format!("/api/animals/{}", server_id);
        self.call(self.request(Method::PUT, &path).json(animal)).await
    }

    async fn list_vaccines(&self) -> Result<Vec<VaccineDto>, ApiError> {
        self.call(self.request(Method::GET, "/api/vaccines")).await
    }

    async fn create_vaccine(&self, vaccine: &VaccineDto) -> Result<VaccineDto, ApiError> {
        self.call(self.request(Method::POST, "/api/vaccines").json(vaccine))
            .await
    }

    async fn update_vaccine(
        &self,
        server_id: i64,
        vaccine: &VaccineDto,
    ) -> Result<VaccineDto, ApiError> {
        let path = format!("/api/vaccines/{}", server_id);
        self.call(self.request(Method::PUT, &path).json(vaccine)).await
    }

    async fn fetch_kpis(&self) -> Result<KpiDto, ApiError> {
        self.call(self.request(Method::GET, "/api/dashboard/kpis"))
            .await
    }

    async fn list_vaccine_types(&self) -> Result<Vec<VaccineTypeDto>, ApiError> {
        self.call(self.request(Method::GET, "/api/vaccine-types"))
            .await
    }

    async fn upload_vaccine_types(
        &self,
        types: &[VaccineTypeDto],
    ) -> Result<Vec<VaccineTypeDto>, ApiError> {
        self.call(self.request(Method::PUT, "/api/vaccine-types").json(types))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/api/animals"), "http://localhost:8080/api/animals");
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = ApiConfig::default();
        assert!(matches!(
            ApiClient::from_config(&config),
            Err(ApiError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.list_animals().await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
