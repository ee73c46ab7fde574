use crate::confidence::ConfidenceConfig;

#[derive(Debug, Clone)]
pub struct MeasureConfig {
    /// Trailing readings kept for confidence estimation.
    pub confidence_buffer_capacity: usize,

    pub confidence: ConfidenceConfig,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            confidence_buffer_capacity: 32,
            confidence: ConfidenceConfig::default(),
        }
    }
}
