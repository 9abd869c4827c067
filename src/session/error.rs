use thiserror::Error;

use crate::camera::CameraError;
use crate::inference::InferenceError;

/// Why a `start()` did not end in a streaming session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("backend health check failed: {0}")]
    BackendUnavailable(#[source] InferenceError),

    #[error("camera acquisition failed: {0}")]
    Camera(#[from] CameraError),

    #[error("start cancelled by stop")]
    Cancelled,

    #[error("session has been shut down")]
    Closed,
}

impl SessionError {
    /// Startup failures move the session to Error; the others leave it alone
    pub fn is_startup_failure(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Camera(_))
    }
}
