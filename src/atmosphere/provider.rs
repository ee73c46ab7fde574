use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure of a location or sea-level-pressure lookup. Passed
/// through unchanged; nothing in the crate retries on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("location permission denied")]
    LocationDenied,
    #[error("location unavailable")]
    LocationUnavailable,
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error("weather service unavailable (HTTP {0})")]
    ServiceUnavailable(u16),
    #[error("location outside weather service coverage")]
    OutOfCoverage,
    #[error("no sea-level pressure reported")]
    NoData,
    #[error("provider error: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationInfo {
    pub id: String,
    pub name: Option<String>,
    pub distance_meters: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeaLevelObservation {
    pub sea_level_pressure_hpa: f64,
    pub timestamp: DateTime<Utc>,
    pub station: Option<StationInfo>,
}

/// Blocking; async callers go through `spawn_blocking`.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Result<Coordinate, ProviderError>;
}

/// Blocking; async callers go through `spawn_blocking`.
pub trait SeaLevelPressureProvider: Send + Sync {
    fn fetch_observation(&self, location: Coordinate) -> Result<SeaLevelObservation, ProviderError>;
}

/// A location that never moves, for hosts that know where they are.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> Result<Coordinate, ProviderError> {
        Ok(self.0)
    }
}
