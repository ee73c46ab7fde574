use chrono::{DateTime, Utc};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::RawReading;

use super::source::ReadingSender;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Produces one raw reading per acquisition tick.
pub trait ReadingGenerator: Send + 'static {
    /// `None` skips the tick (sensor had nothing new).
    fn next_reading(&mut self, timestamp: DateTime<Utc>) -> Option<RawReading>;
}

pub async fn sensing_loop<G: ReadingGenerator>(
    mut generator: G,
    sink: ReadingSender,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut emitted: u64 = 0;

    loop {
        tokio::select! {
            // Cancellation wins over a tick that is ready at the same time.
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop shutting down after {} readings", emitted);
                break;
            }
            _ = ticker.tick() => {
                let Some(reading) = generator.next_reading(Utc::now()) else {
                    continue;
                };
                if sink.send(reading).is_err() {
                    log_warn!("reading receiver dropped, stopping acquisition");
                    break;
                }
                emitted += 1;
            }
        }
    }
}
