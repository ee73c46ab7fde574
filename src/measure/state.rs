use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceResult;
use crate::metrics::SessionMetrics;
use crate::models::{Reading, Session, SessionMode};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MeasureStatus {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl MeasureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureStatus::Idle => "idle",
            MeasureStatus::Recording => "recording",
            MeasureStatus::Paused => "paused",
        }
    }
}

/// Everything a view needs after one pipeline mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureSnapshot {
    pub status: MeasureStatus,
    pub mode: SessionMode,
    pub sensor_active: bool,
    pub current_reading: Option<Reading>,
    /// Current altitude above the zero-reference baseline.
    pub gain_meters: Option<f64>,
    pub session: Option<Session>,
    pub metrics: Option<SessionMetrics>,
    pub confidence: ConfidenceResult,
    pub last_completed: Option<Session>,
    pub availability_message: Option<String>,
    pub sea_level_pressure_kpa: f64,
    pub reference_frozen: bool,
}

impl MeasureSnapshot {
    pub fn idle(mode: SessionMode, sea_level_pressure_kpa: f64) -> Self {
        Self {
            status: MeasureStatus::Idle,
            mode,
            sensor_active: false,
            current_reading: None,
            gain_meters: None,
            session: None,
            metrics: None,
            confidence: ConfidenceResult::default(),
            last_completed: None,
            availability_message: None,
            sea_level_pressure_kpa,
            reference_frozen: false,
        }
    }
}
