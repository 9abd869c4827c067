//! Client side of the remote captioning endpoint
//!
//! - `GET {base}/health` - startup health check
//! - `POST {base}/predict` - multipart frame upload, JSON caption back

pub mod client;
pub mod messages;

pub use client::{HttpInferenceClient, InferenceBackend, InferenceError};
pub use messages::{CaptureResult, PredictResponse};
