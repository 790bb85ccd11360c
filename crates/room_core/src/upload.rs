//! Replay upload to an anonymous file host.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RecordingConfig;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Sends a replay somewhere and returns its public URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError>;
}

pub type SharedUploader = Arc<dyn Uploader>;

/// `HBReplay-2024-05-01T20-15-03-120Z.hbr2`
pub fn replay_file_name(at: DateTime<Utc>) -> String {
    format!("HBReplay-{}.hbr2", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    status: bool,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    url: UploadedUrl,
}

#[derive(Debug, Deserialize)]
struct UploadedUrl {
    full: String,
}

impl UploadResponse {
    fn into_url(self) -> Result<String, UploadError> {
        match (self.status, self.data) {
            (true, Some(data)) => Ok(data.file.url.full),
            (true, None) => Err(UploadError::Rejected("response without file url".to_string())),
            (false, _) => Err(UploadError::Rejected("file host refused the replay".to_string())),
        }
    }
}

/// Multipart POST, file field `file`, retention in the `Expire` header.
pub struct HttpUploader {
    client: reqwest::Client,
    url: String,
    expire_days: u32,
}

impl HttpUploader {
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.upload_url.clone(),
            expire_days: config.expire_days,
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        log::debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), self.url);
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response: UploadResponse = self
            .client
            .post(&self.url)
            .header("Expire", self.expire_days.to_string())
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        let url = response.into_url()?;
        log::info!("Replay uploaded: {}", url);
        Ok(url)
    }
}
