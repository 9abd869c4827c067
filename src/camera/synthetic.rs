// Synthetic camera backend: a moving gradient test pattern

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use image::{Rgb, RgbImage};
use tracing::info;

use super::backend::{CameraBackend, CameraError, MediaSource, Snapshot, VideoConstraints};

/// Camera backend that produces a generated test pattern
///
/// Useful without hardware. The first `warmup_frames` snapshot polls of
/// every acquired stream return `None`, like a real camera that has not
/// decoded its first frame yet.
pub struct SyntheticCamera {
    warmup_frames: u32,
}

impl SyntheticCamera {
    pub fn new(warmup_frames: u32) -> Self {
        Self { warmup_frames }
    }
}

#[async_trait::async_trait]
impl CameraBackend for SyntheticCamera {
    async fn acquire(&self, constraints: VideoConstraints) -> Result<Box<dyn MediaSource>, CameraError> {
        info!(
            "Synthetic camera started ({}x{})",
            constraints.width, constraints.height
        );

        Ok(Box::new(SyntheticStream::new(
            constraints.width,
            constraints.height,
            self.warmup_frames,
        )))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// A live synthetic stream
pub struct SyntheticStream {
    width: u32,
    height: u32,
    warmup_remaining: AtomicU32,
    frame_count: AtomicU64,
    live: AtomicBool,
}

impl SyntheticStream {
    pub fn new(width: u32, height: u32, warmup_frames: u32) -> Self {
        Self {
            width,
            height,
            warmup_remaining: AtomicU32::new(warmup_frames),
            frame_count: AtomicU64::new(0),
            live: AtomicBool::new(true),
        }
    }

    fn render(&self, frame: u64) -> RgbImage {
        let shift = (frame % 256) as u32;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let r = ((x * 255) / self.width.max(1) + shift) % 256;
            let g = ((y * 255) / self.height.max(1)) % 256;
            Rgb([r as u8, g as u8, (255 - shift) as u8])
        })
    }
}

impl MediaSource for SyntheticStream {
    fn snapshot(&self) -> Option<Snapshot> {
        if !self.live.load(Ordering::SeqCst) {
            return None;
        }

        let warming_up = self
            .warmup_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if warming_up {
            return None;
        }

        let frame = self.frame_count.fetch_add(1, Ordering::SeqCst);
        Some(Snapshot::new(self.render(frame)))
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            info!(
                "Synthetic camera stopped after {} frames",
                self.frame_count.load(Ordering::SeqCst)
            );
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
