pub mod config;
pub mod controller;
pub mod error;
pub mod pipeline;
pub mod state;

pub use config::MeasureConfig;
pub use controller::MeasureController;
pub use error::MeasureError;
pub use pipeline::{ReadingPipeline, SENSOR_UNAVAILABLE_MESSAGE};
pub use state::{MeasureSnapshot, MeasureStatus};
