use std::time::Duration;

use crate::camera::VideoConstraints;
use crate::capture::encoder::DEFAULT_JPEG_QUALITY;
use crate::meter::DEFAULT_WINDOW;

/// Configuration for a caption session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-6f1c...")
    pub session_id: String,

    /// Requested camera resolution
    /// Default: 1280x720
    pub constraints: VideoConstraints,

    /// Period between frame samples, independent of camera frame rate
    /// Default: 3 seconds
    pub sample_interval: Duration,

    /// JPEG quality on a [0, 1] scale
    pub jpeg_quality: f32,

    /// Render cadence driving the rate meter (~60Hz)
    pub render_interval: Duration,

    /// Rate meter window
    pub meter_window: Duration,

    /// Ignore responses older than the last applied one instead of letting
    /// the last-arriving response win
    pub discard_stale_responses: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            constraints: VideoConstraints::default(),
            sample_interval: Duration::from_secs(3),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            render_interval: Duration::from_micros(16_667), // 60Hz
            meter_window: DEFAULT_WINDOW,
            discard_stale_responses: false,
        }
    }
}
