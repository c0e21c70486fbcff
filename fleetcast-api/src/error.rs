use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use fleetcast_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    ModelUnavailable(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Prediction engine unavailable: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Prediction engine unavailable".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { .. } => Self::Validation(err.to_string()),
            CoreError::NotFound(msg) => Self::NotFound(format!("Not found: {}", msg)),
            CoreError::ModelUnavailable(msg) => Self::ModelUnavailable(msg),
            CoreError::Store(msg) => Self::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}
