use chrono::{DateTime, Utc};

use crate::models::{seconds_between, Reading, SessionMode};

use super::config::ConfidenceConfig;
use super::regression::{linear_fit, root_mean_square};
use super::{ConfidenceResult, SensorConfidence};

/// Classifies how far the current readings can be trusted.
///
/// Fits a line through the readings of the trailing window and measures the
/// residual RMS around it: a slow climb or a pressure front bends the line,
/// sensor jitter shows up as residual. Input order does not matter.
pub fn estimate<'a, I>(
    readings: I,
    mode: SessionMode,
    is_calibrating: bool,
    is_available: bool,
    now: DateTime<Utc>,
    config: &ConfidenceConfig,
) -> ConfidenceResult
where
    I: IntoIterator<Item = &'a Reading>,
{
    if !is_available {
        return ConfidenceResult::new(SensorConfidence::Unavailable, None, 0);
    }
    if is_calibrating {
        let count = readings.into_iter().count();
        return ConfidenceResult::new(SensorConfidence::Calibrating, None, count);
    }

    let mut recent: Vec<&Reading> = readings
        .into_iter()
        .filter(|reading| seconds_between(reading.timestamp, now) <= config.window_secs)
        .collect();
    recent.sort_by_key(|reading| reading.timestamp);

    if recent.len() < config.min_samples {
        return ConfidenceResult::new(SensorConfidence::WarmingUp, None, recent.len());
    }

    let t0 = recent[0].timestamp;
    let t: Vec<f64> = recent
        .iter()
        .map(|reading| seconds_between(t0, reading.timestamp))
        .collect();
    let y: Vec<f64> = recent
        .iter()
        .map(|reading| match mode {
            SessionMode::Altimeter => reading.absolute_altitude_meters,
            SessionMode::Barometer => reading.pressure_kpa,
        })
        .collect();

    let Some(fit) = linear_fit(&t, &y) else {
        return ConfidenceResult::new(SensorConfidence::Poor, None, recent.len());
    };

    let residuals: Vec<f64> = t
        .iter()
        .zip(&y)
        .map(|(ti, yi)| yi - fit.predict(*ti))
        .collect();
    let rms = root_mean_square(&residuals);

    let confidence = if rms <= config.threshold(mode) {
        SensorConfidence::Good
    } else {
        SensorConfidence::Poor
    };
    ConfidenceResult::new(confidence, Some(rms), recent.len())
}
