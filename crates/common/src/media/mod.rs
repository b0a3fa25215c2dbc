//! Object storage for article images
//!
//! Images go to a storage bucket over HTTP and are referenced from the
//! article by public URL. Upload failures never block publishing; callers
//! decide what to do with the error.

use crate::config::MediaConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Mutex;
use std::time::Duration;

/// Length of the random part of stored object names
const OBJECT_NAME_LEN: usize = 24;

/// Destination for uploaded article images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image and return its public URL
    async fn upload(&self, file_name: &str, content_type: &str, data: Bytes) -> Result<String>;

    /// Whether uploads can succeed at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Build the object key for an upload, keeping the original extension
pub fn object_path(prefix: &str, original_name: &str) -> String {
    let name: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OBJECT_NAME_LEN)
        .map(char::from)
        .collect();

    let ext = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let file = match ext {
        Some(ext) => format!("{}.{}", name, ext),
        None => name,
    };

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file
    } else {
        format!("{}/{}", prefix, file)
    }
}

/// Storage-API compatible bucket client
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    bucket: String,
    path_prefix: String,
}

impl HttpObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
        path_prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create storage HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bucket: bucket.into(),
            path_prefix: path_prefix.into(),
        })
    }

    /// Public URL of a stored object
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ImageStore for HttpObjectStore {
    async fn upload(&self, file_name: &str, content_type: &str, data: Bytes) -> Result<String> {
        let path = object_path(&self.path_prefix, file_name);
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        let size = data.len();

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::StorageUpload {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageUpload {
                message: format!("Storage returned {}: {}", status, body),
            });
        }

        tracing::debug!(path = %path, size, "Image stored");
        Ok(self.public_url(&path))
    }
}

/// Image store used when no object storage is configured
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, _file_name: &str, _content_type: &str, _data: Bytes) -> Result<String> {
        Err(AppError::StorageUpload {
            message: "object storage not configured".to_string(),
        })
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Build the image store described by `config`
pub fn from_config(config: &MediaConfig) -> Result<Box<dyn ImageStore>> {
    match (&config.base_url, &config.api_key) {
        (Some(base_url), Some(api_key)) if !base_url.is_empty() => {
            let store = HttpObjectStore::new(
                base_url.as_str(),
                api_key.as_str(),
                config.bucket.as_str(),
                config.path_prefix.as_str(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(store))
        }
        _ => Ok(Box::new(DisabledImageStore)),
    }
}

/// Mock image store for testing
pub struct MockImageStore {
    fail: bool,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self { fail: false, uploads: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { fail: true, uploads: Mutex::new(Vec::new()) }
    }

    /// (file name, content type, size) of every attempted upload
    pub fn uploads(&self) -> Vec<(String, String, usize)> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, file_name: &str, content_type: &str, data: Bytes) -> Result<String> {
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push((file_name.to_string(), content_type.to_string(), data.len()));
        }

        if self.fail {
            return Err(AppError::StorageUpload {
                message: "mock failure".to_string(),
            });
        }

        Ok(format!("https://images.test/{}", object_path("news-articles", file_name)))
    }
}
