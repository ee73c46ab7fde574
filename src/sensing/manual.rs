use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::models::RawReading;

use super::source::{ReadingSender, SensorSource};

/// Sensor driven by the host: platform callbacks (or tests) push readings
/// through a [`ManualFeed`] while updates are on.
pub struct ManualSensor {
    available: bool,
    sink: Arc<Mutex<Option<ReadingSender>>>,
}

/// Cloneable pushing end of a [`ManualSensor`].
#[derive(Clone)]
pub struct ManualFeed {
    sink: Arc<Mutex<Option<ReadingSender>>>,
}

impl ManualSensor {
    pub fn new(available: bool) -> (Self, ManualFeed) {
        let sink = Arc::new(Mutex::new(None));
        let feed = ManualFeed { sink: sink.clone() };
        (Self { available, sink }, feed)
    }
}

impl SensorSource for ManualSensor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start_updates(&mut self, sink: ReadingSender) -> Result<()> {
        let mut guard = self
            .sink
            .lock()
            .map_err(|_| anyhow!("manual sensor lock poisoned"))?;
        *guard = Some(sink);
        Ok(())
    }

    fn stop_updates(&mut self) {
        if let Ok(mut guard) = self.sink.lock() {
            guard.take();
        }
    }
}

impl ManualFeed {
    /// Returns false when updates are off (the reading is discarded).
    pub fn push(&self, reading: RawReading) -> bool {
        match self.sink.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|sink| sink.send(reading).is_ok())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.sink
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::reading_channel;
    use chrono::Utc;

    fn raw(pressure_kpa: f64) -> RawReading {
        RawReading {
            timestamp: Utc::now(),
            relative_altitude_meters: 0.0,
            pressure_kpa,
        }
    }

    #[test]
    fn push_only_reaches_sink_while_started() {
        let (mut sensor, feed) = ManualSensor::new(true);
        let (tx, mut rx) = reading_channel();

        assert!(!feed.push(raw(100.0)));

        sensor.start_updates(tx).unwrap();
        assert!(feed.is_streaming());
        assert!(feed.push(raw(100.1)));
        assert_eq!(rx.try_recv().unwrap().pressure_kpa, 100.1);

        sensor.stop_updates();
        assert!(!feed.push(raw(100.2)));
        assert!(rx.try_recv().is_err());
    }
}
