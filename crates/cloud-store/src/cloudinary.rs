//! Cloudinary-backed image host.
//!
//! Unsigned multipart upload: the image bytes plus an `upload_preset`
//! field posted to the account's upload endpoint. The hosted `secure_url`
//! comes back in the response body and is what gets persisted on notes.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use notewell_core::images::ImageHost;
use notewell_core::{Result, StoreError};
use serde::Deserialize;

const UPLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    error: Option<CloudinaryError>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: Option<String>,
}

/// Uploads note images to a Cloudinary account via its unsigned preset.
#[derive(Clone)]
pub struct CloudinaryHost {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    /// Override the API endpoint, e.g. for tests.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base, self.cloud_name)
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, local_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| StoreError::unexpected(format!("cannot read image file: {e}")))?;
        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name("note.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| StoreError::unexpected(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    StoreError::connectivity(e.to_string())
                } else {
                    StoreError::unexpected(e.to_string())
                }
            })?;

        let status = response.status();
        let parsed: CloudinaryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::unexpected(format!("malformed upload response: {e}")))?;

        match parsed.secure_url {
            Some(url) if status.is_success() => {
                debug!("image hosted at {url}");
                Ok(url)
            }
            _ => {
                let message = parsed
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Upload failed. No secure URL returned.".to_string());
                error!("image upload failed ({status}): {message}");
                Err(StoreError::api(status.as_u16(), message))
            }
        }
    }
}
