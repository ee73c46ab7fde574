pub mod reading;
pub mod sample;
pub mod session;
pub mod trend;

pub use reading::{RawReading, Reading};
pub use sample::Sample;
pub use session::{Session, SessionMode, SessionState};
pub use trend::Trend;

use chrono::{DateTime, Utc};

/// Signed seconds from `from` to `to`, with sub-millisecond precision.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
