//! Webcam capture using nokhwa.
//!
//! The device handle lives on a dedicated capture thread that keeps the latest
//! decoded frame; snapshots clone that frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::backend::{CameraBackend, CameraError, MediaSource, Snapshot, VideoConstraints};

/// Native webcam backend
pub struct WebcamBackend {
    index: u32,
}

impl WebcamBackend {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// List available webcam devices.
    pub fn list_devices() -> Result<Vec<String>, CameraError> {
        let devices = nokhwa::query(nokhwa::utils::ApiBackend::Auto)
            .map_err(|e| CameraError::DeviceNotFound(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|info| format!("{}: {}", info.index(), info.human_name()))
            .collect())
    }
}

#[async_trait::async_trait]
impl CameraBackend for WebcamBackend {
    async fn acquire(&self, constraints: VideoConstraints) -> Result<Box<dyn MediaSource>, CameraError> {
        info!(
            "Opening webcam {} at {}x{}",
            self.index, constraints.width, constraints.height
        );

        let latest: Arc<Mutex<Option<RgbImage>>> = Arc::new(Mutex::new(None));
        let live = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let index = self.index;
        let thread_latest = Arc::clone(&latest);
        let thread_live = Arc::clone(&live);

        let thread = std::thread::Builder::new()
            .name(format!("webcam-{}", index))
            .spawn(move || capture_loop(index, constraints, thread_latest, thread_live, ready_tx))?;

        let resolution = match ready_rx.await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                return Err(CameraError::OpenFailed(
                    "capture thread exited before the stream opened".to_string(),
                ))
            }
        };

        info!("Webcam opened: {}x{}", resolution.0, resolution.1);

        Ok(Box::new(WebcamStream {
            latest,
            live,
            resolution,
            thread: Mutex::new(Some(thread)),
        }))
    }

    fn name(&self) -> &str {
        "webcam"
    }
}

fn capture_loop(
    index: u32,
    constraints: VideoConstraints,
    latest: Arc<Mutex<Option<RgbImage>>>,
    live: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<(u32, u32), CameraError>>,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
        Resolution::new(constraints.width, constraints.height),
    ));

    let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready_tx.send(Err(CameraError::OpenFailed(e.to_string())));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready_tx.send(Err(CameraError::OpenFailed(e.to_string())));
        return;
    }

    let resolution = camera.resolution();
    if ready_tx
        .send(Ok((resolution.width(), resolution.height())))
        .is_err()
    {
        // Requester went away; release the device.
        let _ = camera.stop_stream();
        return;
    }

    let mut frame_count: u64 = 0;
    while live.load(Ordering::SeqCst) {
        let decoded = match camera.frame().and_then(|buffer| buffer.decode_image::<RgbFormat>()) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Failed to capture webcam frame: {}", e);
                continue;
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        if let Some(image) = RgbImage::from_raw(width, height, decoded.into_raw()) {
            *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(image);
            frame_count += 1;
            debug!("Captured webcam frame {}", frame_count);
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("Failed to stop webcam stream: {}", e);
    }
    info!("Webcam capture stopped after {} frames", frame_count);
}

/// A live webcam stream
pub struct WebcamStream {
    latest: Arc<Mutex<Option<RgbImage>>>,
    live: Arc<AtomicBool>,
    resolution: (u32, u32),
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl MediaSource for WebcamStream {
    fn snapshot(&self) -> Option<Snapshot> {
        if !self.live.load(Ordering::SeqCst) {
            return None;
        }

        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map(Snapshot::new)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // Capture thread exits after its current frame; detach it.
        self.thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

impl Drop for WebcamStream {
    fn drop(&mut self) {
        self.stop();
    }
}
