//! Image attachment lifecycle.
//!
//! Entities hold an optional image reference. References under this
//! deployment's bucket prefix are service-owned: the service uploaded them and
//! must delete them once superseded. Anything else is passed through untouched.
//!
//! Replacing an image is two-phase. `replace` uploads first and hands back an
//! `ImageReplacement`; once the entity write has settled, the replacement
//! either deletes the superseded object (commit) or the fresh upload
//! (rollback). Deletion is always best-effort and never fails the request.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::storage::{ObjectStorage, StorageError};

const KEY_PREFIX: &str = "images";
const FALLBACK_FILENAME: &str = "upload";

/// A binary image taken from a form submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// What a submission said about the image field.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Upload(ImageUpload),
    /// Externally hosted image, adopted verbatim.
    Url(String),
}

#[derive(Clone)]
pub struct ImageAttachments {
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    region: String,
    url_prefix: String,
}

impl ImageAttachments {
    pub fn new(storage: Arc<dyn ObjectStorage>, bucket: String, region: String) -> Self {
        let url_prefix = format!("https://{bucket}.s3.{region}.amazonaws.com/");
        Self {
            storage,
            bucket,
            region,
            url_prefix,
        }
    }

    /// Public URL for an object key in this deployment's bucket.
    pub fn url_for_key(&self, key: &str) -> String {
        format!("{}{key}", self.url_prefix)
    }

    /// Whether this service is responsible for the object behind `url`.
    pub fn is_owned(&self, url: &str) -> bool {
        self.owned_key(url).is_some()
    }

    fn owned_key<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.url_prefix.as_str())
            .filter(|key| !key.is_empty())
    }

    /// Uploads the image under a fresh `images/<millis>-<filename>` key and
    /// returns its public URL.
    ///
    /// Two uploads of the same filename within one millisecond share a key and
    /// the later one wins.
    pub async fn store(&self, upload: ImageUpload) -> Result<String, StorageError> {
        let key = storage_key(Utc::now().timestamp_millis(), &upload.filename);
        let size = upload.data.len();
        self.storage
            .put_object(&key, upload.data, &upload.content_type)
            .await?;
        info!(
            "Stored image s3://{}/{} ({} bytes, region {})",
            self.bucket, key, size, self.region
        );
        Ok(self.url_for_key(&key))
    }

    /// Deletes the object behind `url` if it is service-owned.
    /// Returns `false` without touching storage for foreign URLs.
    pub async fn delete(&self, url: &str) -> Result<bool, StorageError> {
        let Some(key) = self.owned_key(url) else {
            debug!("Leaving externally owned image alone: {url}");
            return Ok(false);
        };
        self.storage.delete_object(key).await?;
        info!("Deleted image s3://{}/{}", self.bucket, key);
        Ok(true)
    }

    /// Best-effort `delete`: failures are logged, never returned.
    pub async fn discard(&self, url: &str) {
        if let Err(e) = self.delete(url).await {
            warn!("Image cleanup failed for {url}: {e}");
        }
    }

    /// Resolves the image field of a create or update.
    ///
    /// - no input: the current reference stays as it is
    /// - URL: adopted verbatim
    /// - upload: stored now, its URL returned
    ///
    /// A service-owned `previous` that ends up superseded is only deleted when
    /// the replacement is settled successfully.
    pub async fn replace(
        &self,
        input: Option<ImageInput>,
        previous: Option<&str>,
    ) -> Result<ImageReplacement, StorageError> {
        let superseded_by = |new_url: &str| {
            previous
                .filter(|old| *old != new_url && self.is_owned(old))
                .map(str::to_owned)
        };

        let replacement = match input {
            None => ImageReplacement::default(),
            Some(ImageInput::Url(url)) => ImageReplacement {
                superseded: superseded_by(&url),
                url: Some(url),
                uploaded: false,
            },
            Some(ImageInput::Upload(upload)) => {
                let url = self.store(upload).await?;
                ImageReplacement {
                    superseded: superseded_by(&url),
                    url: Some(url),
                    uploaded: true,
                }
            }
        };
        Ok(replacement)
    }
}

/// Outcome of `ImageAttachments::replace`, pending the entity write.
#[must_use = "an image replacement must be settled against the entity write"]
#[derive(Debug, Default)]
pub struct ImageReplacement {
    url: Option<String>,
    uploaded: bool,
    superseded: Option<String>,
}

impl ImageReplacement {
    /// The reference to persist, or `None` to keep the current one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Finishes the replacement according to the entity write's outcome and
    /// passes that outcome through.
    pub async fn settle<T>(
        self,
        attachments: &ImageAttachments,
        outcome: Result<T, AppError>,
    ) -> Result<T, AppError> {
        match outcome {
            Ok(value) => {
                self.commit(attachments).await;
                Ok(value)
            }
            Err(e) => {
                self.rollback(attachments).await;
                Err(e)
            }
        }
    }

    async fn commit(self, attachments: &ImageAttachments) {
        if let Some(old) = self.superseded {
            attachments.discard(&old).await;
        }
    }

    async fn rollback(self, attachments: &ImageAttachments) {
        if let (true, Some(url)) = (self.uploaded, self.url) {
            attachments.discard(&url).await;
        }
    }
}

fn storage_key(timestamp_millis: i64, filename: &str) -> String {
    format!("{KEY_PREFIX}/{timestamp_millis}-{}", base_name(filename))
}

/// Last path segment of a client-supplied filename.
fn base_name(filename: &str) -> &str {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() {
        FALLBACK_FILENAME
    } else {
        name
    }
}
