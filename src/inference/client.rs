use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use super::messages::{CaptureResult, PredictResponse};
use crate::capture::EncodedFrame;

/// Multipart field carrying the frame
pub const FRAME_FIELD: &str = "file";
/// Filename attached to the frame part
pub const FRAME_FILENAME: &str = "frame.jpg";
/// Content type of the frame part
pub const FRAME_MIME: &str = "image/jpeg";

/// Errors from a health check or inference call
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("inference rejected with status {status:?}")]
    Rejected {
        status: String,
        message: Option<String>,
    },
}

/// Remote captioning endpoint
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Single bounded health check, no retry
    async fn health(&self) -> Result<(), InferenceError>;

    /// Upload one frame and validate the result
    async fn predict(&self, frame: EncodedFrame) -> Result<CaptureResult, InferenceError>;

    /// Endpoint description for logging
    fn endpoint(&self) -> &str;
}

/// HTTP client for the captioning backend
pub struct HttpInferenceClient {
    client: Client,
    base_url: String,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(base_url: &str, health_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout,
            request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl InferenceBackend for HttpInferenceClient {
    async fn health(&self) -> Result<(), InferenceError> {
        let url = self.url("/health");
        debug!("Probing backend health at {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        info!("Backend at {} is healthy", self.base_url);
        Ok(())
    }

    async fn predict(&self, frame: EncodedFrame) -> Result<CaptureResult, InferenceError> {
        let size = frame.len();
        let part = Part::bytes(frame.bytes)
            .file_name(FRAME_FILENAME)
            .mime_str(FRAME_MIME)?;
        let form = Form::new().part(FRAME_FIELD, part);

        let response = self
            .client
            .post(self.url("/predict"))
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        let body = response.bytes().await?;
        let parsed: PredictResponse = serde_json::from_slice(&body)
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        let result = CaptureResult::try_from(parsed)?;
        debug!(
            "Caption for {}x{} frame ({} bytes): {:?}",
            frame.width, frame.height, size, result.caption
        );

        Ok(result)
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
