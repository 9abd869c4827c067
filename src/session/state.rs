use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::camera::MediaSource;
use crate::inference::CaptureResult;

/// Caption shown while waiting for the first result
pub const WAITING_CAPTION: &str = "Waiting for caption...";
/// Caption shown after the camera is stopped
pub const STOPPED_CAPTION: &str = "Camera stopped";
/// User-facing message for any startup failure
pub const STARTUP_FAILURE_MESSAGE: &str = "Could not connect to backend system.";

/// Connection lifecycle
///
/// `Idle -> Checking -> Connected -> Idle`, `Checking -> Error -> Checking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Checking,
    Connected,
    Error,
}

/// Per-run frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounters {
    /// Ticks that produced a snapshot
    pub frames_sampled: u64,
    /// Ticks skipped because the source had no full frame yet
    pub frames_skipped: u64,
    /// Frames handed to the inference backend
    pub frames_dispatched: u64,
    /// Frames dropped by the encoder or by a stop during encoding
    pub frames_dropped: u64,
    /// Failed or rejected inference calls
    pub inference_failures: u64,
}

/// The single owned state record of a session
///
/// Every async completion carries the epoch it was started under and must
/// re-check it here before mutating anything.
pub(crate) struct SessionState {
    pub connection: ConnectionState,
    pub epoch: u64,
    pub error_message: Option<String>,
    pub caption: String,
    pub inference_time_secs: Option<f64>,
    pub fps: u32,
    pub media: Option<Box<dyn MediaSource>>,
    pub sampler: Option<JoinHandle<()>>,
    pub meter: Option<JoinHandle<()>>,
    pub next_sequence: u64,
    pub applied_sequence: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_result_at: Option<DateTime<Utc>>,
    pub counters: FrameCounters,
    pub closed: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Idle,
            epoch: 0,
            error_message: None,
            caption: WAITING_CAPTION.to_string(),
            inference_time_secs: None,
            fps: 0,
            media: None,
            sampler: None,
            meter: None,
            next_sequence: 0,
            applied_sequence: None,
            started_at: None,
            last_result_at: None,
            counters: FrameCounters::default(),
            closed: false,
        }
    }

    /// True while `epoch` is the live streaming run
    pub fn is_streaming(&self, epoch: u64) -> bool {
        self.connection == ConnectionState::Connected && self.epoch == epoch
    }

    /// True while the start attempt tagged `epoch` is still pending
    pub fn is_checking(&self, epoch: u64) -> bool {
        self.connection == ConnectionState::Checking && self.epoch == epoch
    }

    /// Idle/Error -> Checking; returns the new epoch
    pub fn begin_checking(&mut self) -> u64 {
        self.epoch += 1;
        self.connection = ConnectionState::Checking;
        self.error_message = None;
        self.caption = WAITING_CAPTION.to_string();
        self.inference_time_secs = None;
        self.fps = 0;
        self.next_sequence = 0;
        self.applied_sequence = None;
        self.last_result_at = None;
        self.counters = FrameCounters::default();
        self.epoch
    }

    /// Checking -> Connected with the acquired media
    pub fn connect(&mut self, media: Box<dyn MediaSource>) {
        self.connection = ConnectionState::Connected;
        self.media = Some(media);
        self.started_at = Some(Utc::now());
    }

    /// Checking -> Error; returns false if the attempt was superseded
    pub fn fail(&mut self, epoch: u64) -> bool {
        if !self.is_checking(epoch) {
            return false;
        }

        self.release();
        self.connection = ConnectionState::Error;
        self.error_message = Some(STARTUP_FAILURE_MESSAGE.to_string());
        true
    }

    /// Checking -> Idle for a start attempt that was abandoned mid-flight;
    /// returns false if the attempt already finished or was superseded
    pub fn abandon(&mut self, epoch: u64) -> bool {
        if !self.is_checking(epoch) {
            return false;
        }

        self.stop();
        true
    }

    /// Any state -> Idle with display defaults. Bumps the epoch so pending
    /// callbacks from the previous run become stale.
    ///
    /// Returns the aborted task handles so callers may await them.
    pub fn stop(&mut self) -> Vec<JoinHandle<()>> {
        let handles = self.release();

        if self.connection != ConnectionState::Idle {
            info!("Session {:?} -> Idle", self.connection);
        }

        self.epoch += 1;
        self.connection = ConnectionState::Idle;
        self.error_message = None;
        self.caption = STOPPED_CAPTION.to_string();
        self.inference_time_secs = None;
        self.fps = 0;
        self.started_at = None;
        self.last_result_at = None;
        handles
    }

    /// Cancel the sampler and meter tasks and stop all media tracks
    pub fn release(&mut self) -> Vec<JoinHandle<()>> {
        let handles: Vec<_> = [self.sampler.take(), self.meter.take()]
            .into_iter()
            .flatten()
            .collect();
        for handle in &handles {
            handle.abort();
        }

        if let Some(media) = self.media.take() {
            media.stop();
            debug!("Released camera tracks");
        }

        handles
    }

    /// Apply an inference result if it still belongs to the live run
    pub fn apply_result(
        &mut self,
        epoch: u64,
        sequence: u64,
        result: CaptureResult,
        discard_stale: bool,
    ) -> bool {
        if !self.is_streaming(epoch) {
            debug!("Ignoring result for frame {} from a finished run", sequence);
            return false;
        }

        if discard_stale && self.applied_sequence.is_some_and(|applied| sequence < applied) {
            debug!("Ignoring stale result for frame {}", sequence);
            return false;
        }

        self.caption = result.caption;
        self.inference_time_secs = result.inference_time_secs;
        self.applied_sequence = Some(sequence);
        self.last_result_at = Some(Utc::now());
        true
    }
}
