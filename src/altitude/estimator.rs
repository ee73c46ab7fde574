use crate::models::{RawReading, Reading};

use super::model::clamped_altitude_meters;
use super::reference::PressureReferenceGuard;

/// Resolves raw sensor ticks into readings against the guarded sea-level
/// reference.
#[derive(Debug, Clone, Default)]
pub struct AltitudeEstimator {
    reference: PressureReferenceGuard,
}

impl AltitudeEstimator {
    pub fn new(reference: PressureReferenceGuard) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &PressureReferenceGuard {
        &self.reference
    }

    pub fn reference_mut(&mut self) -> &mut PressureReferenceGuard {
        &mut self.reference
    }

    pub fn sea_level_pressure_kpa(&self) -> f64 {
        self.reference.reference_kpa()
    }

    pub fn estimate(&self, raw: &RawReading) -> Reading {
        Reading::new(
            raw.timestamp,
            raw.relative_altitude_meters,
            raw.pressure_kpa,
            clamped_altitude_meters(raw.pressure_kpa, self.reference.reference_kpa()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw(pressure_kpa: f64) -> RawReading {
        RawReading {
            timestamp: Utc::now(),
            relative_altitude_meters: 0.0,
            pressure_kpa,
        }
    }

    #[test]
    fn readings_during_freeze_use_the_frozen_reference() {
        let mut estimator = AltitudeEstimator::new(PressureReferenceGuard::new(101.325));
        let before = estimator.estimate(&raw(100.0)).absolute_altitude_meters;

        estimator.reference_mut().begin_freeze();
        estimator.reference_mut().set_reference(102.0);
        let during = estimator.estimate(&raw(100.0)).absolute_altitude_meters;
        assert_eq!(before, during);

        estimator.reference_mut().end_freeze();
        let after = estimator.estimate(&raw(100.0)).absolute_altitude_meters;
        assert!(after > before);
    }

    #[test]
    fn live_altitude_is_floored_at_zero() {
        let estimator = AltitudeEstimator::default();
        assert_eq!(estimator.estimate(&raw(103.0)).absolute_altitude_meters, 0.0);
    }
}
