use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a sensor source emits, before any sea-level reference is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub timestamp: DateTime<Utc>,
    pub relative_altitude_meters: f64,
    pub pressure_kpa: f64,
}

/// One sensor tick with the absolute altitude resolved against the
/// reference in effect when it was processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub relative_altitude_meters: f64,
    pub pressure_kpa: f64,
    pub absolute_altitude_meters: f64,
}

impl Reading {
    pub fn new(
        timestamp: DateTime<Utc>,
        relative_altitude_meters: f64,
        pressure_kpa: f64,
        absolute_altitude_meters: f64,
    ) -> Self {
        Self {
            timestamp,
            relative_altitude_meters,
            pressure_kpa,
            absolute_altitude_meters,
        }
    }
}
