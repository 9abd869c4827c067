use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{ConnectionState, FrameCounters, SessionState};

/// Point-in-time view of a session, as rendered by a presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Session identifier
    pub session_id: String,

    /// Connection lifecycle state
    pub state: ConnectionState,

    /// Whether frames are currently being sampled
    pub is_streaming: bool,

    /// User-facing startup failure message
    pub error_message: Option<String>,

    /// Latest caption (stale until a newer result arrives)
    pub caption: String,

    /// Server-side inference time of the latest caption, in seconds
    pub inference_time_secs: Option<f64>,

    /// Render cadence over the last window
    pub fps: u32,

    /// When the current streaming run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the displayed caption arrived
    pub last_result_at: Option<DateTime<Utc>>,

    /// Frame pipeline counters for the current run
    #[serde(flatten)]
    pub counters: FrameCounters,
}

impl SessionStatus {
    pub(crate) fn from_state(session_id: &str, state: &SessionState) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: state.connection,
            is_streaming: state.connection == ConnectionState::Connected,
            error_message: state.error_message.clone(),
            caption: state.caption.clone(),
            inference_time_secs: state.inference_time_secs,
            fps: state.fps,
            started_at: state.started_at,
            last_result_at: state.last_result_at,
            counters: state.counters,
        }
    }
}
