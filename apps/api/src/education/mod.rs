//! Education entries.

pub mod handlers;

use crate::errors::AppError;
use crate::forms::FormSubmission;
use crate::models::education::{EducationChanges, NewEducation};

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "img";

pub fn new_education(form: &FormSubmission) -> Result<NewEducation, AppError> {
    Ok(NewEducation {
        img: None,
        school: form.require("school")?,
        degree: form.require("degree")?,
        date: form.require("date")?,
        desc: form.text("desc"),
        grade: form.text("grade"),
        doc: form.text("doc"),
    })
}

pub fn education_changes(form: &FormSubmission) -> EducationChanges {
    EducationChanges {
        img: None,
        school: form.text("school"),
        degree: form.text("degree"),
        date: form.text("date"),
        desc: form.text("desc"),
        grade: form.text("grade"),
        doc: form.text("doc"),
    }
}
