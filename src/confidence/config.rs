use crate::models::SessionMode;

/// Tunables for the jitter-based confidence estimate.
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
    /// Trailing window, seconds before `now`, that readings must fall in
    pub window_secs: f64,

    /// Fewer readings than this in the window reports warming up
    pub min_samples: usize,

    /// Residual RMS ceiling for a good altimeter reading, meters
    pub altimeter_threshold_m: f64,

    /// Residual RMS ceiling for a good barometer reading, kPa (0.15 hPa)
    pub barometer_threshold_kpa: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            window_secs: 8.0,
            min_samples: 6,
            altimeter_threshold_m: 0.6,
            barometer_threshold_kpa: 0.015,
        }
    }
}

impl ConfidenceConfig {
    pub fn threshold(&self, mode: SessionMode) -> f64 {
        match mode {
            SessionMode::Altimeter => self.altimeter_threshold_m,
            SessionMode::Barometer => self.barometer_threshold_kpa,
        }
    }
}
