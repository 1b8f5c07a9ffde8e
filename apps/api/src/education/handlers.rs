use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::education::{education_changes, new_education, IMAGE_FIELD};
use crate::errors::AppError;
use crate::extract::RecordId;
use crate::forms::FormSubmission;
use crate::models::education::Education;
use crate::state::AppState;

const ENTITY: &str = "Education";

/// POST /api/education
pub async fn handle_create_education(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Education>), AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut input = new_education(&form)?;

    let image = state.attachments.replace(form.take_image(), None).await?;
    input.img = image.url().map(str::to_owned);

    let outcome = state
        .store
        .create_education(&input)
        .await
        .map_err(AppError::from);
    let created = image.settle(&state.attachments, outcome).await?;

    info!("Created education {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/education
pub async fn handle_list_education(
    State(state): State<AppState>,
) -> Result<Json<Vec<Education>>, AppError> {
    Ok(Json(state.store.list_education().await?))
}

/// GET /api/education/:id
pub async fn handle_get_education(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Education>, AppError> {
    let education = state
        .store
        .find_education(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(education))
}

/// PUT /api/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Education>, AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut changes = education_changes(&form);

    let existing = state
        .store
        .find_education(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let image = state
        .attachments
        .replace(form.take_image(), existing.img.as_deref())
        .await?;
    changes.img = image.url().map(str::to_owned);

    let outcome = state
        .store
        .update_education(id, &changes)
        .await
        .map_err(AppError::from)
        .and_then(|updated| updated.ok_or_else(|| AppError::not_found(ENTITY, id)));
    let updated = image.settle(&state.attachments, outcome).await?;

    info!("Updated education {id}");
    Ok(Json(updated))
}

/// DELETE /api/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .store
        .delete_education(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    if let Some(img) = &deleted.img {
        state.attachments.discard(img).await;
    }

    info!("Deleted education {id}");
    Ok(Json(json!({ "message": "Education deleted successfully" })))
}
