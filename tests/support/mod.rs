// In-process camera and inference fakes that record what the session does
// with them.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgb, RgbImage};
use live_caption::{
    CameraBackend, CameraError, CaptionSession, CaptureResult, EncodedFrame, InferenceBackend,
    InferenceError, MediaSource, SessionConfig, SessionStatus, Snapshot, VideoConstraints,
};
use tokio::sync::Semaphore;

// ============================================================================
// Camera
// ============================================================================

/// Counters shared by a fake camera and every stream it hands out
#[derive(Default)]
pub struct CameraStats {
    pub acquisitions: AtomicUsize,
    pub open: AtomicUsize,
    pub max_open: AtomicUsize,
    pub snapshots: AtomicUsize,
    pub snapshots_after_stop: AtomicUsize,
}

impl CameraStats {
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

pub struct FakeCamera {
    pub stats: Arc<CameraStats>,
    pub fail: bool,
    pub warmup: usize,
    acquire_gate: Option<Arc<Semaphore>>,
}

impl FakeCamera {
    pub fn new(stats: Arc<CameraStats>) -> Self {
        Self {
            stats,
            fail: false,
            warmup: 0,
            acquire_gate: None,
        }
    }

    /// Acquisitions block until a permit is added to the returned gate
    pub fn with_acquire_gate(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.acquire_gate = Some(Arc::clone(&gate));
        (self, gate)
    }
}

#[async_trait::async_trait]
impl CameraBackend for FakeCamera {
    async fn acquire(&self, constraints: VideoConstraints) -> Result<Box<dyn MediaSource>, CameraError> {
        self.stats.acquisitions.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.acquire_gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.fail {
            return Err(CameraError::PermissionDenied("camera blocked".to_string()));
        }

        let open = self.stats.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(Box::new(FakeMedia {
            stats: Arc::clone(&self.stats),
            constraints,
            warmup: AtomicUsize::new(self.warmup),
            stopped: AtomicBool::new(false),
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct FakeMedia {
    stats: Arc<CameraStats>,
    constraints: VideoConstraints,
    warmup: AtomicUsize,
    stopped: AtomicBool,
}

impl MediaSource for FakeMedia {
    fn snapshot(&self) -> Option<Snapshot> {
        if self.stopped.load(Ordering::SeqCst) {
            self.stats.snapshots_after_stop.fetch_add(1, Ordering::SeqCst);
            return None;
        }

        if self
            .warmup
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return None;
        }

        self.stats.snapshots.fetch_add(1, Ordering::SeqCst);
        Some(Snapshot::new(RgbImage::from_pixel(
            self.constraints.width,
            self.constraints.height,
            Rgb([10, 20, 30]),
        )))
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.stats.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.constraints.width, self.constraints.height)
    }
}

// ============================================================================
// Inference
// ============================================================================

pub fn caption(text: &str, secs: f64) -> Result<CaptureResult, InferenceError> {
    Ok(CaptureResult {
        caption: text.to_string(),
        inference_time_secs: Some(secs),
    })
}

pub fn rejected() -> Result<CaptureResult, InferenceError> {
    Err(InferenceError::Rejected {
        status: "error".to_string(),
        message: None,
    })
}

pub struct FakeInference {
    pub health_checks: AtomicUsize,
    pub predictions: AtomicUsize,
    pub healthy: AtomicBool,
    health_gate: Option<Semaphore>,
    predict_gate: Option<Semaphore>,
    call_gates: Option<Mutex<Vec<Arc<Semaphore>>>>,
    responses: Mutex<VecDeque<Result<CaptureResult, InferenceError>>>,
    pub frames: Mutex<Vec<EncodedFrame>>,
}

impl FakeInference {
    pub fn healthy() -> Self {
        Self {
            health_checks: AtomicUsize::new(0),
            predictions: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            health_gate: None,
            predict_gate: None,
            call_gates: None,
            responses: Mutex::new(VecDeque::new()),
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy() -> Self {
        let fake = Self::healthy();
        fake.healthy.store(false, Ordering::SeqCst);
        fake
    }

    /// Health checks block until `release_health`
    pub fn with_health_gate(mut self) -> Self {
        self.health_gate = Some(Semaphore::new(0));
        self
    }

    /// Predictions block until `release_predictions`
    pub fn with_predict_gate(mut self) -> Self {
        self.predict_gate = Some(Semaphore::new(0));
        self
    }

    /// Each prediction blocks on its own gate, released with `release_call`,
    /// and answers with the caption `frame <call index>`
    pub fn with_call_gates(mut self) -> Self {
        self.call_gates = Some(Mutex::new(Vec::new()));
        self
    }

    pub fn respond_with(self, responses: Vec<Result<CaptureResult, InferenceError>>) -> Self {
        *self.responses.lock().unwrap() = responses.into();
        self
    }

    pub fn release_health(&self) {
        if let Some(gate) = &self.health_gate {
            gate.add_permits(1);
        }
    }

    pub fn release_predictions(&self, n: usize) {
        if let Some(gate) = &self.predict_gate {
            gate.add_permits(n);
        }
    }

    /// Let the prediction with call index `index` (0-based) complete
    pub fn release_call(&self, index: usize) {
        if let Some(gate) = self.call_gate(index) {
            gate.add_permits(1);
        }
    }

    fn call_gate(&self, index: usize) -> Option<Arc<Semaphore>> {
        let mut gates = self.call_gates.as_ref()?.lock().unwrap();
        while gates.len() <= index {
            gates.push(Arc::new(Semaphore::new(0)));
        }
        Some(Arc::clone(&gates[index]))
    }

    pub fn health_checks(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn predictions(&self) -> usize {
        self.predictions.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InferenceBackend for FakeInference {
    async fn health(&self) -> Result<(), InferenceError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.health_gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InferenceError::Malformed("backend offline".to_string()))
        }
    }

    async fn predict(&self, frame: EncodedFrame) -> Result<CaptureResult, InferenceError> {
        let index = self.predictions.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().unwrap().push(frame);

        if let Some(gate) = &self.predict_gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(gate) = self.call_gate(index) {
            gate.acquire().await.unwrap().forget();
            return caption(&format!("frame {}", index), 0.1);
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| caption("a cat", 0.42))
    }

    fn endpoint(&self) -> &str {
        "fake://inference"
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Small frames and a fast meter so tests stay cheap
pub fn test_config() -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        constraints: VideoConstraints {
            width: 32,
            height: 24,
        },
        render_interval: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

pub fn session_with(
    camera: FakeCamera,
    inference: Arc<FakeInference>,
) -> CaptionSession {
    CaptionSession::new(test_config(), Box::new(camera), inference)
}

pub fn session_with_config(
    config: SessionConfig,
    camera: FakeCamera,
    inference: Arc<FakeInference>,
) -> CaptionSession {
    CaptionSession::new(config, Box::new(camera), inference)
}

/// Poll until the session status satisfies `cond`
pub async fn wait_for_status(
    session: &CaptionSession,
    cond: impl Fn(&SessionStatus) -> bool,
) -> SessionStatus {
    for _ in 0..1000 {
        let status = session.status();
        if cond(&status) {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never met; last status: {:?}", session.status());
}

/// Poll until `cond` holds
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never met");
}
