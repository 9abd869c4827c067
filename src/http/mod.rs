//! HTTP control surface standing in for the start/stop button
//!
//! - POST /session/start - Check backend health, acquire camera, begin streaming
//! - POST /session/stop - Stop streaming and release the camera
//! - POST /session/toggle - Stop if streaming, otherwise start
//! - GET /session/status - Caption, latency, FPS and connection state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;
