//! Multipart form submissions.
//!
//! Every entity write arrives as `multipart/form-data`: flat text fields plus
//! one image field that is either a file part or an external URL string.

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartRejection};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::errors::AppError;
use crate::storage::{ImageInput, ImageUpload};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default)]
pub struct FormSubmission {
    fields: HashMap<String, Vec<String>>,
    image: Option<ImageInput>,
}

impl FormSubmission {
    /// Drains a multipart request. The part named `image_field` becomes the
    /// submission's image; every other part is read as text.
    pub async fn read(
        multipart: Result<Multipart, MultipartRejection>,
        image_field: &str,
    ) -> Result<Self, AppError> {
        let mut multipart = multipart.map_err(|e| {
            AppError::Validation(format!(
                "Unsupported Content-Type, expected multipart/form-data: {e}"
            ))
        })?;

        let mut form = FormSubmission::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == image_field {
                if let Some(filename) = field.file_name().map(str::to_owned) {
                    let content_type = field
                        .content_type()
                        .unwrap_or(DEFAULT_CONTENT_TYPE)
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?;
                    form.set_upload(filename, content_type, data);
                    continue;
                }
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                form.set_image_text(image_field, &text)?;
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            form.push_text(name, text);
        }
        Ok(form)
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Records a file part. Browsers send an empty, unnamed part when no file
    /// was picked; that counts as no image.
    pub fn set_upload(&mut self, filename: String, content_type: String, data: Bytes) {
        if filename.is_empty() && data.is_empty() {
            return;
        }
        self.image = Some(ImageInput::Upload(ImageUpload {
            filename,
            content_type,
            data,
        }));
    }

    /// Records a text value for the image field: blank means no image, an
    /// http(s) URL is adopted as-is, anything else is rejected.
    pub fn set_image_text(&mut self, image_field: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        if !is_http_url(value) {
            return Err(AppError::Validation(format!(
                "{image_field} must be a file upload or an http(s) URL"
            )));
        }
        self.image = Some(ImageInput::Url(value.to_string()));
        Ok(())
    }

    pub fn take_image(&mut self) -> Option<ImageInput> {
        self.image.take()
    }

    /// Last submitted value for `name`, trimmed. Blank values read as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.last())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    pub fn require(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    /// A list field. Accepts repeated fields, a JSON array string, or a
    /// comma-separated string. `None` when the field was not submitted.
    pub fn list(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        let Some(values) = self.fields.get(name) else {
            return Ok(None);
        };

        let mut items = Vec::new();
        for value in values {
            let value = value.trim();
            if value.starts_with('[') {
                let parsed: Vec<String> = serde_json::from_str(value).map_err(|e| {
                    AppError::Validation(format!("{name} must be a JSON array of strings: {e}"))
                })?;
                items.extend(parsed);
            } else {
                items.extend(value.split(',').map(str::to_owned));
            }
        }

        Ok(Some(
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ))
    }

    /// A JSON-encoded field, e.g. a project's `member` array.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| AppError::Validation(format!("{name} is not valid JSON: {e}")))
            })
            .transpose()
    }
}

fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
