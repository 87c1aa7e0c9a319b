use thiserror::Error;

use crate::api::ApiError;

/// Failure of a synchronization phase. None of these discard cached data.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No network connection")]
    NoNetwork,
    #[error("Remote API not configured. Set api.base_url in the config file or HERD_API_URL.")]
    NotConfigured,
    #[error("Remote error: {0}")]
    Remote(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Local store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("A synchronization cycle is already running")]
    AlreadyRunning,
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotConfigured => SyncError::NotConfigured,
            ApiError::Rejected { status, message } => {
                SyncError::Remote(format!("{} (status {})", message, status))
            }
            ApiError::Transport(e) => SyncError::Transport(e),
            ApiError::Decode(e) => SyncError::Transport(format!("malformed response: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_mapping() {
        let err: SyncError = ApiError::Rejected {
            status: 422,
            message: "tag required".to_string(),
        }
        .into();
        assert!(matches!(&err, SyncError::Remote(m) if m == "tag required (status 422)"));

        let err: SyncError = ApiError::Decode("expected value".to_string()).into();
        assert!(matches!(&err, SyncError::Transport(m) if m.contains("malformed")));

        let err: SyncError = ApiError::NotConfigured.into();
        assert!(matches!(err, SyncError::NotConfigured));
    }
}
