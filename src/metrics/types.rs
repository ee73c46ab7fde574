use serde::{Deserialize, Serialize};

use crate::models::Trend;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub total_ascent_meters: f64,
    pub total_descent_meters: f64,
    pub max_altitude_meters: f64,
    pub min_altitude_meters: f64,
    pub net_change_meters: f64,
    pub pressure_change_kpa: Option<f64>,
    pub duration_ms: i64,
    pub pressure_trend: Trend,
    pub altitude_trend: Trend,
    pub sample_count: usize,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            total_ascent_meters: 0.0,
            total_descent_meters: 0.0,
            max_altitude_meters: 0.0,
            min_altitude_meters: 0.0,
            net_change_meters: 0.0,
            pressure_change_kpa: None,
            duration_ms: 0,
            pressure_trend: Trend::Steady,
            altitude_trend: Trend::Steady,
            sample_count: 0,
        }
    }
}
