use serde::{Deserialize, Serialize};

use super::client::InferenceError;

/// Status discriminator the endpoint uses for a successful caption
pub const STATUS_SUCCESS: &str = "success";

/// Raw body returned by `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub status: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub inference_time: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A validated caption result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Generated caption text
    pub caption: String,
    /// Server-side inference duration in seconds, if reported
    pub inference_time_secs: Option<f64>,
}

impl TryFrom<PredictResponse> for CaptureResult {
    type Error = InferenceError;

    fn try_from(response: PredictResponse) -> Result<Self, Self::Error> {
        if response.status != STATUS_SUCCESS {
            return Err(InferenceError::Rejected {
                status: response.status,
                message: response.message,
            });
        }

        let caption = response
            .caption
            .ok_or_else(|| InferenceError::Malformed("success without caption".to_string()))?;

        Ok(Self {
            caption,
            inference_time_secs: response.inference_time.filter(|t| t.is_finite()),
        })
    }
}
