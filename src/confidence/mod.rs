pub mod config;
pub mod estimator;
pub mod regression;

pub use config::ConfidenceConfig;
pub use estimator::estimate;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SensorConfidence {
    Unavailable,
    Calibrating,
    WarmingUp,
    Good,
    Poor,
}

impl SensorConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorConfidence::Unavailable => "unavailable",
            SensorConfidence::Calibrating => "calibrating",
            SensorConfidence::WarmingUp => "warmingUp",
            SensorConfidence::Good => "good",
            SensorConfidence::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub confidence: SensorConfidence,
    pub residual_rms: Option<f64>,
    pub sample_count: usize,
}

impl ConfidenceResult {
    pub fn new(confidence: SensorConfidence, residual_rms: Option<f64>, sample_count: usize) -> Self {
        Self {
            confidence,
            residual_rms,
            sample_count,
        }
    }
}

impl Default for ConfidenceResult {
    fn default() -> Self {
        Self::new(SensorConfidence::WarmingUp, None, 0)
    }
}
