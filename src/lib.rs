pub mod altitude;
pub mod atmosphere;
pub mod confidence;
pub mod db;
pub mod measure;
pub mod metrics;
pub mod models;
pub mod sensing;
pub mod settings;
pub mod units;
pub mod utils;

pub use altitude::{AltitudeEstimator, PressureReferenceGuard, STANDARD_SEA_LEVEL_KPA};
pub use confidence::{ConfidenceConfig, ConfidenceResult, SensorConfidence};
pub use measure::{MeasureController, MeasureError, MeasureSnapshot, MeasureStatus, ReadingPipeline};
pub use metrics::SessionMetrics;
pub use models::{RawReading, Reading, Sample, Session, SessionMode, SessionState, Trend};
pub use settings::{SettingsStore, UserSettings};

/// Initialize logging (reads RUST_LOG env var). Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
