use super::config::SessionConfig;
use super::error::SessionError;
use super::state::{ConnectionState, SessionState};
use super::stats::SessionStatus;
use crate::camera::CameraBackend;
use crate::capture::sampler;
use crate::inference::InferenceBackend;
use crate::meter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// State and collaborators shared between the session and its tasks
pub(crate) struct Shared {
    pub config: SessionConfig,
    pub camera: Box<dyn CameraBackend>,
    pub inference: Arc<dyn InferenceBackend>,
    state: Mutex<SessionState>,
}

impl Shared {
    /// Lock the state record. Never held across an await.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A camera-to-inference session
///
/// Owns the camera stream while streaming, plus exactly one sampler task and
/// one rate meter task, both cancelled whenever the session leaves Connected.
pub struct CaptionSession {
    shared: Arc<Shared>,
}

impl CaptionSession {
    /// Create an idle session
    pub fn new(
        config: SessionConfig,
        camera: Box<dyn CameraBackend>,
        inference: Arc<dyn InferenceBackend>,
    ) -> Self {
        info!(
            "Creating caption session {} (camera: {}, backend: {})",
            config.session_id,
            camera.name(),
            inference.endpoint()
        );

        Self {
            shared: Arc::new(Shared {
                config,
                camera,
                inference,
                state: Mutex::new(SessionState::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.config.session_id
    }

    /// Idle/Error -> Checking -> Connected
    ///
    /// Checks backend health once, then acquires the camera. Either failure
    /// leaves the session in Error with nothing acquired. A call made while
    /// a start is already pending, or while streaming, is a no-op.
    pub async fn start(&self) -> Result<(), SessionError> {
        let epoch = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(SessionError::Closed);
            }

            match state.connection {
                ConnectionState::Checking => {
                    debug!("Start already in progress");
                    return Ok(());
                }
                ConnectionState::Connected => {
                    debug!("Session already streaming");
                    return Ok(());
                }
                ConnectionState::Idle | ConnectionState::Error => state.begin_checking(),
            }
        };
        let _pending = PendingStart {
            shared: Arc::clone(&self.shared),
            epoch,
        };

        info!("Starting caption session: {}", self.id());

        // 1. Check backend health
        if let Err(e) = self.shared.inference.health().await {
            return Err(self.fail(epoch, SessionError::BackendUnavailable(e)));
        }

        if !self.shared.lock().is_checking(epoch) {
            info!("Start cancelled before camera acquisition");
            return Err(SessionError::Cancelled);
        }

        // 2. Acquire camera
        let media = match self
            .shared
            .camera
            .acquire(self.shared.config.constraints)
            .await
        {
            Ok(media) => media,
            Err(e) => return Err(self.fail(epoch, SessionError::Camera(e))),
        };

        let mut state = self.shared.lock();
        if !state.is_checking(epoch) {
            media.stop();
            info!("Start cancelled; released camera acquired after stop");
            return Err(SessionError::Cancelled);
        }

        let (width, height) = media.resolution();
        state.connect(media);
        state.sampler = Some(tokio::spawn(sampler::run(Arc::clone(&self.shared), epoch)));
        state.meter = Some(tokio::spawn(meter::run(Arc::clone(&self.shared), epoch)));

        info!(
            "Caption session streaming at {}x{}, sampling every {:?}",
            width, height, self.shared.config.sample_interval
        );

        Ok(())
    }

    /// Connected -> Idle
    ///
    /// Once this returns no further frame is sampled, camera tracks are
    /// stopped, and display values are back to their defaults. Results of
    /// in-flight inference calls are ignored when they land. Also cancels a
    /// pending start and clears an Error.
    pub fn stop(&self) -> SessionStatus {
        let mut state = self.shared.lock();
        if state.connection != ConnectionState::Idle {
            info!("Stopping caption session: {}", self.id());
            state.stop();
        }
        SessionStatus::from_state(self.id(), &state)
    }

    /// Stop if streaming, otherwise start
    pub async fn toggle(&self) -> Result<SessionStatus, SessionError> {
        let streaming = self.shared.lock().connection == ConnectionState::Connected;
        if streaming {
            Ok(self.stop())
        } else {
            self.start().await?;
            Ok(self.status())
        }
    }

    /// Get current session status
    pub fn status(&self) -> SessionStatus {
        let state = self.shared.lock();
        SessionStatus::from_state(self.id(), &state)
    }

    /// Tear the session down for good and wait for its tasks to finish
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.shared.lock();
            state.closed = true;
            state.stop()
        };

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("Session task panicked: {}", e);
                }
            }
        }

        info!("Caption session {} shut down", self.id());
    }

    fn fail(&self, epoch: u64, err: SessionError) -> SessionError {
        if self.shared.lock().fail(epoch) {
            error!("Connection error: {}", err);
        } else {
            debug!("Ignoring failure of superseded start: {}", err);
        }
        err
    }
}

impl Drop for CaptionSession {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.closed = true;
        state.stop();
    }
}

/// Returns the session to Idle if a start future is dropped while its
/// attempt is still Checking, e.g. on a timeout or a disconnected caller.
/// A no-op once the attempt connected, failed or was superseded.
struct PendingStart {
    shared: Arc<Shared>,
    epoch: u64,
}

impl Drop for PendingStart {
    fn drop(&mut self) {
        if self.shared.lock().abandon(self.epoch) {
            warn!("Start abandoned before completion; session back to Idle");
        }
    }
}
