use chrono::Duration;

use crate::models::{Sample, Trend};

/// A recency window and the dead band applied to the change across it.
#[derive(Debug, Clone, Copy)]
pub struct TrendWindow {
    pub window_secs: i64,
    pub threshold: f64,
}

/// 30 s window, ±0.08 kPa.
pub const PRESSURE_TREND: TrendWindow = TrendWindow {
    window_secs: 30,
    threshold: 0.08,
};

/// 10 s window, ±0.6 m.
pub const ALTITUDE_TREND: TrendWindow = TrendWindow {
    window_secs: 10,
    threshold: 0.6,
};

pub fn pressure_trend(samples: &[Sample]) -> Trend {
    windowed_trend(samples, PRESSURE_TREND, |sample| sample.pressure_kpa)
}

pub fn altitude_trend(samples: &[Sample]) -> Trend {
    windowed_trend(samples, ALTITUDE_TREND, |sample| sample.absolute_altitude_meters)
}

/// Compares the last sample against the earliest one inside
/// `[latest - window, latest]`. Samples are expected in timestamp order.
pub fn windowed_trend(samples: &[Sample], config: TrendWindow, value: impl Fn(&Sample) -> f64) -> Trend {
    let Some(latest) = samples.last() else {
        return Trend::Steady;
    };
    let cutoff = latest.timestamp - Duration::seconds(config.window_secs);

    let mut in_window = samples
        .iter()
        .filter(|sample| sample.timestamp >= cutoff && sample.timestamp <= latest.timestamp);
    let Some(first) = in_window.next() else {
        return Trend::Steady;
    };
    if in_window.next().is_none() {
        return Trend::Steady;
    }

    Trend::from_delta(value(latest) - value(first), config.threshold)
}
