//! Caption session management
//!
//! This module provides the `CaptionSession` state machine that manages:
//! - Backend health check and camera acquisition on start
//! - Periodic frame sampling and inference dispatch while connected
//! - Rate meter for the render cadence
//! - Release of camera tracks and tasks on every exit from Connected

mod config;
mod error;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::CaptionSession;
pub(crate) use session::Shared;
pub use state::{
    ConnectionState, FrameCounters, STARTUP_FAILURE_MESSAGE, STOPPED_CAPTION, WAITING_CAPTION,
};
pub use stats::SessionStatus;
