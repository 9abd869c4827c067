use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::camera::Snapshot;

/// Default JPEG quality on a [0, 1] scale
pub const DEFAULT_JPEG_QUALITY: f32 = 0.7;

/// A compressed frame ready for upload
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Source width in pixels
    pub width: u32,
    /// Source height in pixels
    pub height: u32,
}

impl EncodedFrame {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Map a [0, 1] quality factor onto the codec's 1..=100 scale
pub fn codec_quality(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
}

/// Compress a snapshot to JPEG off the async executor
///
/// Returns `None` when there is nothing to encode (zero-area snapshot) or the
/// codec fails; callers drop the frame.
pub async fn encode_jpeg(snapshot: Snapshot, quality: f32) -> Option<EncodedFrame> {
    if snapshot.is_empty() {
        debug!("Skipping zero-area snapshot");
        return None;
    }

    match tokio::task::spawn_blocking(move || encode_blocking(&snapshot, quality)).await {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Encoder task failed: {}", e);
            None
        }
    }
}

fn encode_blocking(snapshot: &Snapshot, quality: f32) -> Option<EncodedFrame> {
    let (width, height) = snapshot.dimensions();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, codec_quality(quality));

    if let Err(e) = encoder.encode_image(&snapshot.image) {
        debug!("JPEG encoding failed for {}x{} frame: {}", width, height, e);
        return None;
    }

    if bytes.is_empty() {
        return None;
    }

    Some(EncodedFrame {
        bytes,
        width,
        height,
    })
}
