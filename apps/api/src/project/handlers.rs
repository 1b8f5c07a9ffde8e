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
use crate::forms::FormSubmission;
use crate::models::project::ProjectWithMembers;
use crate::project::{
    new_project, project_changes, submitted_members, superseded_member_images, IMAGE_FIELD,
};
use crate::state::AppState;

const ENTITY: &str = "Project";

/// POST /api/project
pub async fn handle_create_project(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ProjectWithMembers>), AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut input = new_project(&form)?;
    let members = submitted_members(&form)?;

    let image = state.attachments.replace(form.take_image(), None).await?;
    input.image = image.url().map(str::to_owned);

    let outcome = state
        .store
        .create_project(&input, &members)
        .await
        .map_err(AppError::from);
    let created = image.settle(&state.attachments, outcome).await?;

    info!(
        "Created project {} with {} members",
        created.project.id,
        created.members.len()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/project
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectWithMembers>>, AppError> {
    Ok(Json(state.store.list_projects().await?))
}

/// GET /api/project/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<ProjectWithMembers>, AppError> {
    let project = state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;
    Ok(Json(project))
}

/// PUT /api/project/:id
///
/// Members carrying an `id` are updated, the rest inserted. Members left out
/// of the submission stay attached to the project. A member image replaced
/// by the update is cleaned up like the project image.
pub async fn handle_update_project(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProjectWithMembers>, AppError> {
    let mut form = FormSubmission::read(multipart, IMAGE_FIELD).await?;
    let mut changes = project_changes(&form);
    let members = submitted_members(&form)?;

    let existing = state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let image = state
        .attachments
        .replace(form.take_image(), existing.project.image.as_deref())
        .await?;
    changes.image = image.url().map(str::to_owned);

    let outcome = state
        .store
        .update_project(id, &changes, &members)
        .await
        .map_err(AppError::from)
        .and_then(|updated| updated.ok_or_else(|| AppError::not_found(ENTITY, id)));
    let updated = image.settle(&state.attachments, outcome).await?;

    for url in superseded_member_images(&existing.members, &updated.members) {
        state.attachments.discard(&url).await;
    }

    info!(
        "Updated project {id} ({} members submitted)",
        members.len()
    );
    Ok(Json(updated))
}

/// DELETE /api/project/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<Value>, AppError> {
    let deleted = state
        .store
        .delete_project(id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    let images = deleted
        .project
        .image
        .iter()
        .chain(deleted.members.iter().filter_map(|m| m.img.as_ref()));
    for url in images {
        state.attachments.discard(url).await;
    }

    info!(
        "Deleted project {id} and {} members",
        deleted.members.len()
    );
    Ok(Json(json!({
        "message": format!("Project with ID {id} and its members have been deleted.")
    })))
}

/// DELETE /api/project
///
/// Removes every project and member. Stored images are not cleaned up.
pub async fn handle_delete_all_projects(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let removed = state.store.delete_all_projects().await?;
    info!("Deleted all projects ({removed})");
    Ok(Json(json!({
        "message": "All projects and their members have been deleted.",
        "deleted": removed
    })))
}
