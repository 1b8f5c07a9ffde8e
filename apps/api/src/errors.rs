use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl AppError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        AppError::NotFound(format!("{entity} {id} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Upstream failures are logged in full under a reference id; the caller
        // only ever sees the generic message and the reference.
        let (code, message, reference) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone(), None),
            AppError::Database(e) => {
                let reference = Uuid::new_v4();
                tracing::error!(%reference, "Database error: {e}");
                (
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    Some(reference),
                )
            }
            AppError::Storage(msg) => {
                let reference = Uuid::new_v4();
                tracing::error!(%reference, "Storage error: {msg}");
                (
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                    Some(reference),
                )
            }
            AppError::Internal(e) => {
                let reference = Uuid::new_v4();
                tracing::error!(%reference, "Internal error: {e:?}");
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(reference),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(reference) = reference {
            error["reference"] = json!(reference.to_string());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
