pub mod estimator;
pub mod model;
pub mod reference;

pub use estimator::AltitudeEstimator;
pub use model::{
    altitude_meters, clamped_altitude_meters, sea_level_pressure_from_station,
    STANDARD_SEA_LEVEL_KPA,
};
pub use reference::PressureReferenceGuard;
