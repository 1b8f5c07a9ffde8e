//! Work experience entries.

pub mod handlers;

use crate::errors::AppError;
use crate::forms::FormSubmission;
use crate::models::experience::{ExperienceChanges, NewExperience};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "img";

pub fn new_experience(form: &FormSubmission) -> Result<NewExperience, AppError> {
    Ok(NewExperience {
        img: None,
        role: form.require("role")?,
        company: form.require("company")?,
        date: form.require("date")?,
        desc: form.require("desc")?,
        skills: form.list("skills")?.unwrap_or_default(),
        doc: form.text("doc"),
    })
}

pub fn experience_changes(form: &FormSubmission) -> Result<ExperienceChanges, AppError> {
    Ok(ExperienceChanges {
        img: None,
        role: form.text("role"),
        company: form.text("company"),
        date: form.text("date"),
        desc: form.text("desc"),
        skills: form.list("skills")?,
        doc: form.text("doc"),
    })
}
