pub mod backend;
pub mod synthetic;

#[cfg(feature = "webcam")]
pub mod webcam;

pub use backend::{
    CameraBackend, CameraBackendFactory, CameraError, CameraSource, MediaSource, Snapshot,
    VideoConstraints,
};
pub use synthetic::{SyntheticCamera, SyntheticStream};
