use image::RgbImage;
use thiserror::Error;
use tokio::time::Instant;

/// Errors that can occur while acquiring a camera stream.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported camera source: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Requested video stream parameters (best-effort, the device may differ)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    /// Target frame width in pixels
    pub width: u32,
    /// Target frame height in pixels
    pub height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// A still frame pulled from a live media source, at the source's native size
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// RGB pixel data
    pub image: RgbImage,
    /// When the frame was pulled
    pub captured_at: Instant,
}

impl Snapshot {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
        }
    }

    /// Image dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True when the snapshot has no pixels
    pub fn is_empty(&self) -> bool {
        let (width, height) = self.dimensions();
        width == 0 || height == 0
    }
}

/// An acquired live camera stream
///
/// Owned exclusively by the session while streaming. The sampler only reads
/// frames from it; only the session calls `stop`.
pub trait MediaSource: Send + Sync {
    /// Pull the most recent full frame
    ///
    /// Returns `None` while the stream has not decoded a complete frame yet
    /// (normal right after the camera starts) or after `stop`.
    fn snapshot(&self) -> Option<Snapshot>;

    /// Stop all tracks and release the device. Must be idempotent.
    fn stop(&self);

    /// Whether the tracks are still running
    fn is_live(&self) -> bool;

    /// Actual stream resolution (width, height)
    fn resolution(&self) -> (u32, u32);
}

/// Camera acquisition backend trait
///
/// Implementations:
/// - Synthetic: generated test pattern (development and tests)
/// - Webcam: native device capture via nokhwa (`webcam` feature)
#[async_trait::async_trait]
pub trait CameraBackend: Send + Sync {
    /// Request a video-only stream close to the given constraints
    async fn acquire(&self, constraints: VideoConstraints) -> Result<Box<dyn MediaSource>, CameraError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Camera source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    /// Generated test pattern
    Synthetic,
    /// Native webcam by device index (requires the `webcam` feature)
    Device(u32),
}

impl std::str::FromStr for CameraSource {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "synthetic" => Ok(Self::Synthetic),
            other => other
                .parse::<u32>()
                .map(Self::Device)
                .map_err(|_| CameraError::Unsupported(other.to_string())),
        }
    }
}

/// Camera backend factory
pub struct CameraBackendFactory;

impl CameraBackendFactory {
    /// Create a camera backend for the given source
    ///
    /// `warmup_frames` only applies to the synthetic source: the number of
    /// snapshot polls that report "not ready" after acquisition.
    pub fn create(
        source: CameraSource,
        warmup_frames: u32,
    ) -> Result<Box<dyn CameraBackend>, CameraError> {
        match source {
            CameraSource::Synthetic => Ok(Box::new(super::synthetic::SyntheticCamera::new(
                warmup_frames,
            ))),

            CameraSource::Device(index) => {
                #[cfg(feature = "webcam")]
                {
                    Ok(Box::new(super::webcam::WebcamBackend::new(index)))
                }

                #[cfg(not(feature = "webcam"))]
                {
                    Err(CameraError::Unsupported(format!(
                        "device {} (build with the `webcam` feature)",
                        index
                    )))
                }
            }
        }
    }
}
