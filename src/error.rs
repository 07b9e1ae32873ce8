use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum StorewatchError {
    #[error("A monitor run is already active")]
    MonitorAlreadyRunning,

    #[error("No monitor run is active")]
    MonitorNotActive,

    #[error("Unknown job: {0}")]
    JobNotFound(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Health check failed: {0}")]
    HealthCheck(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<chromiumoxide::error::CdpError> for StorewatchError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        StorewatchError::Browser(e.to_string())
    }
}

impl IntoResponse for StorewatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            StorewatchError::MonitorAlreadyRunning => StatusCode::CONFLICT,
            StorewatchError::MonitorNotActive => StatusCode::CONFLICT,
            StorewatchError::JobNotFound(_) => StatusCode::NOT_FOUND,
            StorewatchError::UnknownRegion(_) => StatusCode::BAD_REQUEST,
            StorewatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StorewatchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            StorewatchError::HealthCheck(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorewatchError::Browser(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorewatchError::Process(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorewatchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorewatchError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorewatchError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
