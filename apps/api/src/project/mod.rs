//! Projects and their team members.

pub mod handlers;

use crate::errors::AppError;
use crate::forms::FormSubmission;
use crate::models::project::{Member, MemberInput, NewProject, ProjectChanges};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the JSON member array.
pub const MEMBER_FIELD: &str = "member";

pub fn new_project(form: &FormSubmission) -> Result<NewProject, AppError> {
    Ok(NewProject {
        title: form.require("title")?,
        description: form.text("description"),
        image: None,
        date: form.text("date"),
        category: form.text("category"),
        github: form.text("github"),
        webapp: form.text("webapp"),
    })
}

pub fn project_changes(form: &FormSubmission) -> ProjectChanges {
    ProjectChanges {
        title: form.text("title"),
        description: form.text("description"),
        image: None,
        date: form.text("date"),
        category: form.text("category"),
        github: form.text("github"),
        webapp: form.text("webapp"),
    }
}

/// Parses the submitted member array. A missing field means no members.
pub fn submitted_members(form: &FormSubmission) -> Result<Vec<MemberInput>, AppError> {
    let members: Vec<MemberInput> = form.json(MEMBER_FIELD)?.unwrap_or_default();
    if let Some(position) = members.iter().position(|m| m.name.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "{MEMBER_FIELD}[{position}].name is required"
        )));
    }
    Ok(members)
}

/// Images that stored members held before an update and no longer hold after
/// it. Members missing from `after` are not considered.
pub fn superseded_member_images(before: &[Member], after: &[Member]) -> Vec<String> {
    before
        .iter()
        .filter_map(|old| {
            let old_img = old.img.as_ref()?;
            let current = after.iter().find(|m| m.id == old.id)?;
            (current.img.as_ref() != Some(old_img)).then(|| old_img.clone())
        })
        .collect()
}
