//! Request extractors that reject with `AppError` instead of axum's plain-text
//! rejections.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::errors::AppError;

/// The numeric `:id` segment of an entity route.
///
/// A segment that is not an integer is a validation error. An integer too
/// large for an id cannot match any row, so it reads as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        parse_record_id(&raw)
    }
}

fn parse_record_id(raw: &str) -> Result<RecordId, AppError> {
    if let Ok(id) = raw.parse::<i32>() {
        return Ok(RecordId(id));
    }
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("No record with id {raw}")));
    }
    Err(AppError::Validation(format!(
        "id must be an integer, got '{raw}'"
    )))
}
