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

use crate::errors::AppError;
use crate::extract::RecordId;
use crate::experience::{experience_changes, new_experience, IMAGE_FIELD};
use crate::forms::FormSubmission;
use crate::models::experience::Experience;
use crate::state::AppState;

const ENTITY: &str = "Experience";

/// POST /api/experiences
pub async fn handle_create_experience(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Experience>), AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut input = new_experience(&form)?;

    let image = state.attachments.replace(form.take_image(), None).await?;
    input.img = image.url().map(str::to_owned);

    let outcome = state
        .store
        .create_experience(&input)
        .await
        .map_err(AppError::from);
    let created = image.settle(&state.attachments, outcome).await?;

    info!("Created experience {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/experiences
pub async fn handle_list_experiences(
    State(state): State<AppState>,
) -> Result<Json<Vec<Experience>>, AppError> {
    Ok(Json(state.store.list_experiences().await?))
}

/// GET /api/experiences/:id
pub async fn handle_get_experience(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Experience>, AppError> {
    let experience = state
        .store
        .find_experience(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(experience))
}

/// PUT /api/experiences/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Experience>, AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut changes = experience_changes(&form)?;

    let existing = state
        .store
        .find_experience(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let image = state
        .attachments
        .replace(form.take_image(), existing.img.as_deref())
        .await?;
    changes.img = image.url().map(str::to_owned);

    // The row may have been deleted since it was read.
    let outcome = state
        .store
        .update_experience(id, &changes)
        .await
        .map_err(AppError::from)
        .and_then(|updated| updated.ok_or_else(|| AppError::not_found(ENTITY, id)));
    let updated = image.settle(&state.attachments, outcome).await?;

    info!("Updated experience {id}");
    Ok(Json(updated))
}

/// DELETE /api/experiences/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .store
        .delete_experience(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    if let Some(img) = &deleted.img {
        state.attachments.discard(img).await;
    }

    info!("Deleted experience {id}");
    Ok(Json(json!({ "message": "Experience deleted successfully" })))
}
