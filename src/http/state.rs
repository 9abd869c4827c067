use crate::session::CaptionSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one caption session this process drives
    pub session: Arc<CaptionSession>,
}

impl AppState {
    pub fn new(session: Arc<CaptionSession>) -> Self {
        Self { session }
    }
}
