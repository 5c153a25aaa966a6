use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum FirelinkError {
    #[error("credential file not found at: {}", path.display())]
    CredentialNotFound { path: PathBuf },

    #[error("malformed credential file: {0}")]
    CredentialMalformed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("query failed: {0}")]
    QueryFailure(String),

    #[error("upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Whether a failed operation is worth another attempt under the bounded
/// retry policy. Only transient transport faults and upstream 5xx qualify;
/// definitive rejections are not retried.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FirelinkError {
    fn is_retryable(&self) -> bool {
        match self {
            FirelinkError::Reqwest(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            FirelinkError::UpstreamStatus(code) => code.is_server_error(),
            _ => false,
        }
    }
}

/// Error body served by the probe endpoint.
#[derive(Serialize)]
pub struct ProbeErrorBody {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl IntoResponse for FirelinkError {
    fn into_response(self) -> axum::response::Response {
        error!("request failed: {}", self);
        let body = ProbeErrorBody {
            success: false,
            message: "Could not reach the database service".to_string(),
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
