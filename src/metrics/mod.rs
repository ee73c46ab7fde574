//! Derived session figures: ascent/descent, extrema, net change, elapsed
//! time and short-window trends.
//!
//! Everything here is a pure function of an in-memory sample slice in
//! timestamp order. Degenerate input yields zero / steady, never an error.
//! `insights` works the same way over a list of stored sessions.

pub mod insights;
mod trend;
mod types;

pub use trend::{altitude_trend, pressure_trend, windowed_trend, TrendWindow, ALTITUDE_TREND, PRESSURE_TREND};
pub use insights::{session_insights, SessionInsights};
pub use types::SessionMetrics;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Sample, Session};

pub fn total_ascent(samples: &[Sample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| pair[1].absolute_altitude_meters - pair[0].absolute_altitude_meters)
        .filter(|gain| *gain > 0.0)
        .sum()
}

pub fn total_descent(samples: &[Sample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| pair[0].absolute_altitude_meters - pair[1].absolute_altitude_meters)
        .filter(|loss| *loss > 0.0)
        .sum()
}

pub fn max_altitude(samples: &[Sample]) -> f64 {
    samples
        .iter()
        .map(|sample| sample.absolute_altitude_meters)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

pub fn min_altitude(samples: &[Sample]) -> f64 {
    samples
        .iter()
        .map(|sample| sample.absolute_altitude_meters)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

pub fn net_change(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.absolute_altitude_meters - first.absolute_altitude_meters,
        _ => 0.0,
    }
}

pub fn pressure_change(samples: &[Sample]) -> Option<f64> {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => Some(last.pressure_kpa - first.pressure_kpa),
        _ => None,
    }
}

impl Session {
    /// Elapsed time: closed sessions report their span, live ones the time
    /// since `start_date`.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.end_date.unwrap_or(now) - self.start_date
    }

    pub fn total_ascent_meters(&self) -> f64 {
        total_ascent(&self.samples)
    }

    pub fn total_descent_meters(&self) -> f64 {
        total_descent(&self.samples)
    }

    pub fn max_altitude_meters(&self) -> f64 {
        max_altitude(&self.samples)
    }

    pub fn min_altitude_meters(&self) -> f64 {
        min_altitude(&self.samples)
    }

    pub fn net_altitude_change_meters(&self) -> f64 {
        net_change(&self.samples)
    }

    pub fn pressure_trend(&self) -> crate::models::Trend {
        pressure_trend(&self.samples)
    }

    pub fn metrics(&self, now: DateTime<Utc>) -> SessionMetrics {
        SessionMetrics {
            total_ascent_meters: self.total_ascent_meters(),
            total_descent_meters: self.total_descent_meters(),
            max_altitude_meters: self.max_altitude_meters(),
            min_altitude_meters: self.min_altitude_meters(),
            net_change_meters: self.net_altitude_change_meters(),
            pressure_change_kpa: pressure_change(&self.samples),
            duration_ms: self.duration(now).num_milliseconds(),
            pressure_trend: pressure_trend(&self.samples),
            altitude_trend: altitude_trend(&self.samples),
            sample_count: self.samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionMode, Trend};

    fn session_with_altitudes(altitudes: &[f64]) -> Session {
        let start = Utc::now();
        let mut session = Session::begin(SessionMode::Altimeter, start);
        session.samples = altitudes
            .iter()
            .enumerate()
            .map(|(i, alt)| Sample::new(start + Duration::seconds(i as i64 * 10), 0.0, 101.3, *alt))
            .collect();
        session
    }

    #[test]
    fn ascent_and_descent() {
        let mut session = session_with_altitudes(&[100.0, 105.0, 103.0, 111.0]);
        session.end_date = Some(session.start_date + Duration::seconds(30));

        assert!((session.total_ascent_meters() - 13.0).abs() < 1e-3);
        assert!((session.total_descent_meters() - 2.0).abs() < 1e-3);
        assert_eq!(session.duration(Utc::now()), Duration::seconds(30));
        assert!((session.max_altitude_meters() - 111.0).abs() < 1e-3);
        assert!((session.min_altitude_meters() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn net_altitude_change() {
        let session = session_with_altitudes(&[120.0, 132.0, 128.0]);
        assert!((session.net_altitude_change_meters() - 8.0).abs() < 1e-3);
    }

    #[test]
    fn empty_and_single_sample_sessions_are_zero() {
        let empty = session_with_altitudes(&[]);
        assert_eq!(empty.total_ascent_meters(), 0.0);
        assert_eq!(empty.max_altitude_meters(), 0.0);
        assert_eq!(empty.min_altitude_meters(), 0.0);
        assert_eq!(empty.net_altitude_change_meters(), 0.0);
        assert!(pressure_change(&empty.samples).is_none());

        let single = session_with_altitudes(&[250.0]);
        assert_eq!(single.total_ascent_meters(), 0.0);
        assert_eq!(single.total_descent_meters(), 0.0);
        assert_eq!(single.max_altitude_meters(), 250.0);
    }

    #[test]
    fn live_session_duration_runs_to_now() {
        let session = session_with_altitudes(&[100.0]);
        let now = session.start_date + Duration::seconds(95);
        assert_eq!(session.duration(now), Duration::seconds(95));
    }

    #[test]
    fn metrics_summary_collects_everything() {
        let session = session_with_altitudes(&[100.0, 105.0, 103.0, 111.0]);
        let metrics = session.metrics(session.start_date + Duration::seconds(40));

        assert_eq!(metrics.sample_count, 4);
        assert_eq!(metrics.duration_ms, 40_000);
        assert_eq!(metrics.pressure_change_kpa, Some(0.0));
        assert_eq!(metrics.pressure_trend, Trend::Steady);
        // Last 10 s holds 103 -> 111.
        assert_eq!(metrics.altitude_trend, Trend::Rising);
    }
}
