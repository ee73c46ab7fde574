//! Pressure sensor sources and the acquisition loop that feeds readings to
//! the measurement pipeline.

pub mod controller;
pub mod loop_worker;
pub mod manual;
pub mod simulated;
mod source;

pub use controller::SensingController;
pub use loop_worker::ReadingGenerator;
pub use manual::{ManualFeed, ManualSensor};
pub use simulated::{PreviewPattern, SimulatedSensor};
pub use source::{reading_channel, ReadingReceiver, ReadingSender, SensorSource};
