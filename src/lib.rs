pub mod camera;
pub mod capture;
pub mod config;
pub mod http;
pub mod inference;
pub mod meter;
pub mod session;

pub use camera::{
    CameraBackend, CameraBackendFactory, CameraError, CameraSource, MediaSource, Snapshot,
    VideoConstraints,
};
pub use capture::{encode_jpeg, EncodedFrame};
pub use config::Config;
pub use http::{create_router, AppState};
pub use inference::{CaptureResult, HttpInferenceClient, InferenceBackend, InferenceError};
pub use meter::RateMeter;
pub use session::{CaptionSession, ConnectionState, SessionConfig, SessionError, SessionStatus};
