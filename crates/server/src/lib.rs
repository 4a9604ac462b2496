//! Assessment Server
//!
//! HTTP surface over the turn assessor and the individual analyzers.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_http_request};
pub use state::{AppState, ServiceStatus};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tutor_assessment::AssessmentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AssessmentError> for ServerError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::InvalidConfig(msg) => ServerError::InvalidConfig(msg),
            AssessmentError::Lexicon(msg) => ServerError::Internal(msg),
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            ServerError::Startup(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StatusCode::from(&ServerError::InvalidConfig("weights".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StatusCode::from(&ServerError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_assessment_error_conversion() {
        let err: ServerError = AssessmentError::InvalidConfig("empty language".into()).into();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
        let err: ServerError = AssessmentError::Lexicon("missing file".into()).into();
        assert!(matches!(err, ServerError::Internal(_)));
    }
}
