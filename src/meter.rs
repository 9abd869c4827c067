//! Rolling frames-per-second counter for the render cadence
//!
//! Counts ticks since the last window boundary; once a full window has
//! elapsed the count is scaled to frames per second, published, and reset.
//! It measures UI liveness, not inference throughput.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::session::Shared;

/// Default measurement window
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct RateMeter {
    window: Duration,
    count: u32,
    window_start: Instant,
    fps: u32,
}

impl RateMeter {
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            window,
            count: 0,
            window_start: now,
            fps: 0,
        }
    }

    /// Record one tick; returns the new FPS when a window closed
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.count = self.count.saturating_add(1);
        self.flush(now)
    }

    /// Close the window if it has elapsed, even with zero ticks in it
    pub fn flush(&mut self, now: Instant) -> Option<u32> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }

        let fps = (f64::from(self.count) / elapsed.as_secs_f64()).round() as u32;
        self.fps = fps;
        self.count = 0;
        self.window_start = now;
        Some(fps)
    }

    /// Last published FPS
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Drop the current window and publish zero
    pub fn reset(&mut self, now: Instant) {
        self.count = 0;
        self.fps = 0;
        self.window_start = now;
    }
}

impl Default for RateMeter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, Instant::now())
    }
}

/// Meter loop for one streaming run, ticking at the render cadence
///
/// Publishes each closed window into the session while `epoch` is live.
pub(crate) async fn run(shared: Arc<Shared>, epoch: u64) {
    let mut ticker = tokio::time::interval(shared.config.render_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut meter = RateMeter::new(shared.config.meter_window, Instant::now());

    loop {
        let now = ticker.tick().await;
        let Some(fps) = meter.tick(now) else {
            continue;
        };

        let mut state = shared.lock();
        if !state.is_streaming(epoch) {
            break;
        }
        state.fps = fps;
    }

    debug!("Rate meter stopped");
}
