//! Shared fixtures for unit and router tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{ImageAttachments, ObjectStorage, StorageError};
use crate::store::memory::MemoryStore;

pub const TEST_BUCKET: &str = "portfolio-test";
pub const TEST_REGION: &str = "us-east-1";

/// `ObjectStorage` that keeps objects in memory and records every call.
#[derive(Default)]
pub struct RecordingStorage {
    objects: Mutex<BTreeMap<String, String>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingStorage {
    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn put_object(
        &self,
        key: &str,
        _body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("injected put failure".into()));
        }
        self.puts.lock().unwrap().push(key.to_string());
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content_type.to_string());
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.lock().unwrap().push(key.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete("injected delete failure".into()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn attachments_with(storage: RecordingStorage) -> (ImageAttachments, Arc<RecordingStorage>) {
    let storage = Arc::new(storage);
    let attachments = ImageAttachments::new(
        storage.clone(),
        TEST_BUCKET.to_string(),
        TEST_REGION.to_string(),
    );
    (attachments, storage)
}

/// Service-owned URL for `key` in the test bucket.
pub fn owned_url(key: &str) -> String {
    format!("https://{TEST_BUCKET}.s3.{TEST_REGION}.amazonaws.com/{key}")
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        aws_region: TEST_REGION.to_string(),
        aws_bucket_name: TEST_BUCKET.to_string(),
        s3_endpoint: None,
        port: 0,
        rust_log: "debug".to_string(),
        max_upload_bytes: 1024 * 1024,
        run_migrations: false,
    }
}

/// A router over in-memory backends, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<RecordingStorage>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let (attachments, storage) = attachments_with(RecordingStorage::default());
        let state = AppState {
            store: store.clone(),
            attachments,
            config: test_config(),
        };
        TestApp {
            router: build_router(state),
            store,
            storage,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn submit(&self, method: Method, uri: &str, form: MultipartForm) -> (StatusCode, Value) {
        self.send(form.into_request(method, uri)).await
    }
}

const BOUNDARY: &str = "----portfolio-test-boundary";

/// Builds `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, method: Method, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
