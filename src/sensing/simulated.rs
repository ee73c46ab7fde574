use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::Duration;

use crate::models::RawReading;

use super::controller::SensingController;
use super::loop_worker::ReadingGenerator;
use super::source::{ReadingSender, SensorSource};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// Used when `HOWHIGH_DEBUG` is set, so demos move faster.
pub const DEBUG_INTERVAL: Duration = Duration::from_millis(250);

const BASE_ALTITUDE_M: f64 = 150.0;
const SEA_LEVEL_HPA: f64 = 1013.25;
const HPA_PER_METER: f64 = 0.12;

/// Smooth synthetic walk: a slow oscillating drift plus an occasional climb.
///
/// Clones share the tick counter, so a restarted acquisition task continues
/// the walk instead of jumping back to the start.
#[derive(Debug, Clone, Default)]
pub struct PreviewPattern {
    tick: Arc<AtomicU64>,
}

impl PreviewPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks emitted so far.
    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn reading_at(&self, tick: u64, timestamp: DateTime<Utc>) -> RawReading {
        let t = tick as f64;
        let drift = (t / 15.0).sin() * 5.0;
        let climb = ((t / 30.0).sin() * 50.0).max(0.0);
        let relative = drift + climb;
        let pressure_hpa = SEA_LEVEL_HPA - (BASE_ALTITUDE_M + relative) * HPA_PER_METER;

        RawReading {
            timestamp,
            relative_altitude_meters: relative,
            pressure_kpa: pressure_hpa / 10.0,
        }
    }
}

impl ReadingGenerator for PreviewPattern {
    fn next_reading(&mut self, timestamp: DateTime<Utc>) -> Option<RawReading> {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        Some(self.reading_at(tick, timestamp))
    }
}

/// Stand-in sensor for hosts without a barometer.
pub struct SimulatedSensor {
    controller: SensingController,
    pattern: PreviewPattern,
    interval: Duration,
    available: bool,
}

impl SimulatedSensor {
    pub fn new(interval: Duration) -> Self {
        Self {
            controller: SensingController::new(),
            pattern: PreviewPattern::new(),
            interval,
            available: true,
        }
    }

    /// Picks the interval from `HOWHIGH_DEBUG` (`1` or `true`).
    pub fn from_env() -> Self {
        let debug = std::env::var("HOWHIGH_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self::new(if debug { DEBUG_INTERVAL } else { DEFAULT_INTERVAL })
    }

    /// A simulated sensor that reports itself missing.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(DEFAULT_INTERVAL)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_active()
    }
}

impl SensorSource for SimulatedSensor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start_updates(&mut self, sink: ReadingSender) -> Result<()> {
        self.controller
            .start_sensing(self.pattern.clone(), sink, self.interval)
    }

    fn stop_updates(&mut self) {
        self.controller.stop_sensing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::reading_channel;

    #[test]
    fn preview_pattern_tracks_relative_altitude_in_pressure() {
        let pattern = PreviewPattern::new();
        let now = Utc::now();
        let low = pattern.reading_at(0, now);
        // sin(15/30) > 0, so the climb term is active here.
        let high = pattern.reading_at(15, now);

        assert_eq!(low.relative_altitude_meters, 0.0);
        assert!(high.relative_altitude_meters > low.relative_altitude_meters);
        assert!(high.pressure_kpa < low.pressure_kpa);
        assert!((low.pressure_kpa - (1013.25 - 150.0 * 0.12) / 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn delivers_readings_until_stopped() {
        let (tx, mut rx) = reading_channel();
        let mut sensor = SimulatedSensor::new(Duration::from_millis(100));
        sensor.start_updates(tx).unwrap();
        assert!(sensor.is_running());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.timestamp >= first.timestamp);

        sensor.stop_updates();
        assert!(!sensor.is_running());
        // The loop drops its sender on cancellation, closing the channel.
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn restart_continues_the_walk() {
        let mut sensor = SimulatedSensor::new(Duration::from_millis(50));

        let (tx, mut rx) = reading_channel();
        sensor.start_updates(tx).unwrap();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        sensor.stop_updates();
        while rx.recv().await.is_some() {}

        let (tx, mut rx) = reading_channel();
        sensor.start_updates(tx).unwrap();
        let resumed = rx.recv().await.unwrap();
        sensor.stop_updates();

        let expected = PreviewPattern::new().reading_at(3, resumed.timestamp);
        assert_eq!(resumed.relative_altitude_meters, expected.relative_altitude_meters);
        assert_eq!(sensor.pattern.tick(), 3);
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let mut sensor = SimulatedSensor::new(DEFAULT_INTERVAL);
        sensor.stop_updates();
        sensor.stop_updates();
        assert!(!sensor.is_running());
    }

    #[test]
    fn start_outside_runtime_fails_cleanly() {
        let (tx, _rx) = reading_channel();
        let mut sensor = SimulatedSensor::new(DEFAULT_INTERVAL);
        assert!(sensor.start_updates(tx).is_err());
    }

    #[test]
    fn unavailable_variant_reports_missing() {
        assert!(!SimulatedSensor::unavailable().is_available());
        assert!(SimulatedSensor::new(DEFAULT_INTERVAL).is_available());
    }
}
