use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::camera::{CameraSource, VideoConstraints};
use crate::session::SessionConfig;

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "LIVE_CAPTION_API_URL";
/// Backend base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
    pub meter: MeterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub api_url: String,
    pub health_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// "synthetic" or a device index
    pub camera: String,
    pub width: u32,
    pub height: u32,
    pub interval_ms: u64,
    pub jpeg_quality: f32,
    pub warmup_frames: u32,
    pub discard_stale_responses: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeterConfig {
    pub tick_hz: u32,
    pub window_ms: u64,
}

impl Config {
    /// Load config from an optional file, then apply the API URL override
    /// from the environment
    pub fn load(path: &str) -> Result<Self> {
        let api_url = std::env::var(API_URL_ENV).ok().filter(|url| !url.is_empty());
        Self::load_with_api_url(path, api_url)
    }

    pub fn load_with_api_url(path: &str, api_url: Option<String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("service.name", "live-caption")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000)?
            .set_default("backend.api_url", DEFAULT_API_URL)?
            .set_default("backend.health_timeout_secs", 5)?
            .set_default("backend.request_timeout_secs", 30)?
            .set_default("capture.camera", "synthetic")?
            .set_default("capture.width", 1280)?
            .set_default("capture.height", 720)?
            .set_default("capture.interval_ms", 3000)?
            .set_default("capture.jpeg_quality", 0.7)?
            .set_default("capture.warmup_frames", 0)?
            .set_default("capture.discard_stale_responses", false)?
            .set_default("meter.tick_hz", 60)?
            .set_default("meter.window_ms", 1000)?
            .add_source(config::File::with_name(path).required(false));

        if let Some(url) = api_url {
            builder = builder.set_override("backend.api_url", url)?;
        }

        let settings = builder.build().context("Failed to build configuration")?;

        Ok(settings
            .try_deserialize()
            .context("Failed to parse configuration")?)
    }

    pub fn camera_source(&self) -> Result<CameraSource> {
        self.capture
            .camera
            .parse()
            .with_context(|| format!("Invalid camera source {:?}", self.capture.camera))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.health_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            constraints: VideoConstraints {
                width: self.capture.width,
                height: self.capture.height,
            },
            sample_interval: Duration::from_millis(self.capture.interval_ms.max(1)),
            jpeg_quality: self.capture.jpeg_quality,
            render_interval: Duration::from_secs(1) / self.meter.tick_hz.max(1),
            meter_window: Duration::from_millis(self.meter.window_ms.max(1)),
            discard_stale_responses: self.capture.discard_stale_responses,
            ..SessionConfig::default()
        }
    }
}
