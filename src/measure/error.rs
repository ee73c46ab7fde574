use thiserror::Error;

/// Rejected pipeline transitions. A rejected call leaves state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MeasureError {
    #[error("barometer unavailable on this device")]
    SensorUnavailable,
    #[error("a session is already in progress")]
    SessionActive,
    #[error("no session is recording")]
    NotRecording,
    #[error("no paused session to resume")]
    NotPaused,
    #[error("no session to stop")]
    NoSession,
    #[error("zero-reference calibration is only available in altimeter mode")]
    CalibrationUnsupported,
    #[error("failed to start sensor updates: {0}")]
    SensorStart(String),
}
