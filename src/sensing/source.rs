use anyhow::Result;
use tokio::sync::mpsc;

use crate::models::RawReading;

/// Producer side of the reading handoff. Unbounded so the acquisition side
/// never blocks; FIFO so readings reach the pipeline in capture order.
pub type ReadingSender = mpsc::UnboundedSender<RawReading>;
pub type ReadingReceiver = mpsc::UnboundedReceiver<RawReading>;

pub fn reading_channel() -> (ReadingSender, ReadingReceiver) {
    mpsc::unbounded_channel()
}

/// A pressure sensor the pipeline can switch on and off.
pub trait SensorSource: Send {
    fn is_available(&self) -> bool;

    /// Begins delivering readings into `sink` until `stop_updates`.
    fn start_updates(&mut self, sink: ReadingSender) -> Result<()>;

    /// Stops delivery. Must take effect immediately and be safe to call
    /// when updates were never started.
    fn stop_updates(&mut self);
}
