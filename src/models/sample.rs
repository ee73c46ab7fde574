use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Reading;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub relative_altitude_meters: f64,
    pub pressure_kpa: f64,
    pub absolute_altitude_meters: f64,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Utc>,
        relative_altitude_meters: f64,
        pressure_kpa: f64,
        absolute_altitude_meters: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            relative_altitude_meters,
            pressure_kpa,
            absolute_altitude_meters,
        }
    }

    /// Builds a sample relative to `baseline`, the altitude treated as zero.
    pub fn from_reading(reading: &Reading, baseline: f64) -> Self {
        let relative = reading.absolute_altitude_meters - baseline;
        Self::new(
            reading.timestamp,
            relative,
            reading.pressure_kpa,
            baseline + relative,
        )
    }
}
