//! HTTP error responses.

use crate::error::{LoadError, ReportError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    /// The dataset could not be loaded.
    Load(LoadError),
    /// Report generation failed.
    Report(ReportError),
    /// A blocking task panicked or was cancelled.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Load(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("DATASET_UNAVAILABLE", e.to_string()),
            ),
            AppError::Report(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPORT_FAILED", e.to_string()),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };
        error!(status = %status, code = %body.code, message = %body.message, "request failed");
        (status, Json(body)).into_response()
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::Load(err)
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::Report(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn load_errors_map_to_service_unavailable() {
        let err = AppError::from(LoadError::SourceNotFound {
            path: PathBuf::from("gone.csv"),
        });
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn report_errors_map_to_server_error() {
        let err = AppError::from(ReportError::Pdf("broken".into()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
