use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::encoder::encode_jpeg;
use crate::camera::Snapshot;
use crate::session::Shared;

/// Sampling loop for one streaming run
///
/// Ticks on a fixed period, starting one period after the run began. Every
/// tick re-checks that `epoch` is still the live run before touching the
/// camera, so a stop racing a pending tick never samples.
pub(crate) async fn run(shared: Arc<Shared>, epoch: u64) {
    let period = shared.config.sample_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Frame sampler started ({:?} period)", period);

    loop {
        ticker.tick().await;

        let (sequence, snapshot) = {
            let mut state = shared.lock();
            if !state.is_streaming(epoch) {
                break;
            }

            let Some(snapshot) = state.media.as_ref().and_then(|media| media.snapshot()) else {
                state.counters.frames_skipped += 1;
                trace!("Video source not ready, skipping tick");
                continue;
            };

            state.counters.frames_sampled += 1;
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            (sequence, snapshot)
        };

        // Responses are not serialized; several calls may be in flight.
        tokio::spawn(dispatch(Arc::clone(&shared), epoch, sequence, snapshot));
    }

    info!("Frame sampler stopped");
}

/// Encode one snapshot, upload it, and apply the caption if the run is live
async fn dispatch(shared: Arc<Shared>, epoch: u64, sequence: u64, snapshot: Snapshot) {
    let Some(frame) = encode_jpeg(snapshot, shared.config.jpeg_quality).await else {
        shared.lock().counters.frames_dropped += 1;
        debug!("Encoder produced no blob for frame {}, dropping", sequence);
        return;
    };

    {
        let mut state = shared.lock();
        if !state.is_streaming(epoch) {
            state.counters.frames_dropped += 1;
            debug!("Session stopped while encoding frame {}, dropping", sequence);
            return;
        }
        state.counters.frames_dispatched += 1;
    }

    match shared.inference.predict(frame).await {
        Ok(result) => {
            let applied = shared.lock().apply_result(
                epoch,
                sequence,
                result,
                shared.config.discard_stale_responses,
            );
            if applied {
                debug!("Applied caption for frame {}", sequence);
            }
        }
        Err(e) => {
            shared.lock().counters.inference_failures += 1;
            warn!("Error sending frame {}: {}", sequence, e);
        }
    }
}
