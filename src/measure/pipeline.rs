use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::altitude::{AltitudeEstimator, PressureReferenceGuard};
use crate::confidence::{self, ConfidenceResult};
use crate::db::SessionSink;
use crate::models::{RawReading, Reading, Sample, Session, SessionMode};
use crate::sensing::{ReadingSender, SensorSource};

use super::config::MeasureConfig;
use super::error::MeasureError;
use super::state::{MeasureSnapshot, MeasureStatus};

pub const SENSOR_UNAVAILABLE_MESSAGE: &str = "Barometer unavailable on this device.";

/// Turns sensor readings into a recording session.
///
/// Single-context state machine: every method takes `&mut self`, so the
/// owner decides where it runs (see `MeasureController`). Nothing here
/// blocks; completed sessions are handed to the sink, which queues them.
pub struct ReadingPipeline {
    mode: SessionMode,
    config: MeasureConfig,
    estimator: AltitudeEstimator,
    sensor: Box<dyn SensorSource>,
    readings: ReadingSender,
    sink: Arc<dyn SessionSink>,
    status: MeasureStatus,
    sensor_active: bool,
    current_reading: Option<Reading>,
    confidence_buffer: VecDeque<Reading>,
    confidence: ConfidenceResult,
    baseline: Option<f64>,
    pending_calibration: bool,
    session: Option<Session>,
    samples: Vec<Sample>,
    last_completed: Option<Session>,
    availability_message: Option<String>,
}

impl ReadingPipeline {
    /// `readings` is handed to the sensor whenever updates start; its
    /// receiving end belongs to whoever drives `handle_raw`.
    pub fn new(
        mode: SessionMode,
        sensor: Box<dyn SensorSource>,
        readings: ReadingSender,
        sink: Arc<dyn SessionSink>,
    ) -> Self {
        Self::with_config(mode, sensor, readings, sink, MeasureConfig::default())
    }

    pub fn with_config(
        mode: SessionMode,
        sensor: Box<dyn SensorSource>,
        readings: ReadingSender,
        sink: Arc<dyn SessionSink>,
        config: MeasureConfig,
    ) -> Self {
        let capacity = config.confidence_buffer_capacity;
        let mut pipeline = Self {
            mode,
            config,
            estimator: AltitudeEstimator::default(),
            sensor,
            readings,
            sink,
            status: MeasureStatus::Idle,
            sensor_active: false,
            current_reading: None,
            confidence_buffer: VecDeque::with_capacity(capacity),
            confidence: ConfidenceResult::default(),
            baseline: None,
            pending_calibration: false,
            session: None,
            samples: Vec::new(),
            last_completed: None,
            availability_message: None,
        };
        pipeline.recompute_confidence(Utc::now());
        pipeline
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn status(&self) -> MeasureStatus {
        self.status
    }

    pub fn is_sensor_active(&self) -> bool {
        self.sensor_active
    }

    pub fn current_reading(&self) -> Option<&Reading> {
        self.current_reading.as_ref()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn last_completed(&self) -> Option<&Session> {
        self.last_completed.as_ref()
    }

    pub fn confidence(&self) -> ConfidenceResult {
        self.confidence
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn is_calibration_pending(&self) -> bool {
        self.pending_calibration
    }

    pub fn availability_message(&self) -> Option<&str> {
        self.availability_message.as_deref()
    }

    pub fn reference(&self) -> &PressureReferenceGuard {
        self.estimator.reference()
    }

    pub fn sea_level_pressure_kpa(&self) -> f64 {
        self.estimator.sea_level_pressure_kpa()
    }

    /// Altitude above the zero-reference, once both are known.
    pub fn gain_meters(&self) -> Option<f64> {
        match (self.current_reading, self.baseline) {
            (Some(reading), Some(baseline)) => Some(reading.absolute_altitude_meters - baseline),
            _ => None,
        }
    }

    /// Live readings without recording.
    pub fn start_monitoring(&mut self) -> Result<(), MeasureError> {
        self.require_sensor()?;
        self.ensure_updates()
    }

    /// Stops live readings. Ignored while a session is recording.
    pub fn stop_monitoring(&mut self) {
        if self.status != MeasureStatus::Recording {
            self.halt_updates();
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), MeasureError> {
        if self.session.is_some() {
            return Err(MeasureError::SessionActive);
        }
        self.require_sensor()?;
        self.ensure_updates()?;

        self.baseline = None;
        self.samples.clear();
        self.session = Some(Session::begin(self.mode, now));
        self.status = MeasureStatus::Recording;
        info!("{} session started", self.mode.as_str());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), MeasureError> {
        if self.status != MeasureStatus::Recording {
            return Err(MeasureError::NotRecording);
        }
        self.halt_updates();
        self.status = MeasureStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), MeasureError> {
        let has_open_session = self.session.as_ref().is_some_and(Session::is_recording);
        if self.status != MeasureStatus::Paused || !has_open_session {
            return Err(MeasureError::NotPaused);
        }
        self.ensure_updates()?;
        self.status = MeasureStatus::Recording;
        Ok(())
    }

    /// Finalizes the session and hands it to the sink.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Session, MeasureError> {
        let mut session = self.session.take().ok_or(MeasureError::NoSession)?;
        self.halt_updates();

        session.samples = mem::take(&mut self.samples);
        session.mode = self.mode;
        session.finalize(now);

        if let Err(err) = self.sink.persist(&session) {
            error!("failed to persist session {}: {err:#}", session.id);
        }

        self.baseline = None;
        self.pending_calibration = false;
        self.status = MeasureStatus::Idle;
        self.recompute_confidence(now);
        self.last_completed = Some(session.clone());
        info!(
            "{} session {} completed with {} samples",
            self.mode.as_str(),
            session.id,
            session.samples.len()
        );
        Ok(session)
    }

    /// Re-zeroes on the next reading. A recording session drops its samples
    /// but keeps its start date, so elapsed time keeps running.
    pub fn calibrate(&mut self) -> Result<(), MeasureError> {
        if self.mode != SessionMode::Altimeter {
            return Err(MeasureError::CalibrationUnsupported);
        }
        self.pending_calibration = true;
        self.recompute_confidence(Utc::now());
        Ok(())
    }

    /// Processes one sensor tick. Readings that arrive after updates were
    /// stopped are dropped and yield `None`.
    pub fn handle_raw(&mut self, raw: RawReading) -> Option<Reading> {
        if !self.sensor_active {
            debug!("dropping reading from {} after updates stopped", raw.timestamp);
            return None;
        }
        let reading = self.estimator.estimate(&raw);
        self.ingest(reading);
        Some(reading)
    }

    fn ingest(&mut self, reading: Reading) {
        self.current_reading = Some(reading);

        if self.confidence_buffer.len() >= self.config.confidence_buffer_capacity {
            self.confidence_buffer.pop_front();
        }
        self.confidence_buffer.push_back(reading);

        if self.pending_calibration {
            self.pending_calibration = false;
            self.baseline = Some(reading.absolute_altitude_meters);
            if let Some(session) = self.session.as_mut() {
                self.samples.clear();
                session.samples.clear();
            }
            debug!("zero-reference set to {:.2} m", reading.absolute_altitude_meters);
        }

        self.recompute_confidence(reading.timestamp);

        if self.status != MeasureStatus::Recording {
            return;
        }
        let baseline = *self
            .baseline
            .get_or_insert(reading.absolute_altitude_meters);
        self.samples.push(Sample::from_reading(&reading, baseline));
        if let Some(session) = self.session.as_mut() {
            session.samples = self.samples.clone();
        }
    }

    fn recompute_confidence(&mut self, now: DateTime<Utc>) {
        self.confidence = confidence::estimate(
            self.confidence_buffer.iter(),
            self.mode,
            self.pending_calibration,
            self.sensor.is_available(),
            now,
            &self.config.confidence,
        );
    }

    pub fn set_sea_level_pressure(&mut self, kpa: f64) {
        self.estimator.reference_mut().set_reference(kpa);
    }

    pub fn begin_reference_freeze(&mut self) {
        self.estimator.reference_mut().begin_freeze();
    }

    pub fn end_reference_freeze(&mut self) {
        self.estimator.reference_mut().end_freeze();
    }

    /// Applies a provider reading (hPa) as one frozen update and returns
    /// the requested reference in kPa. Inside an outer freeze the value
    /// stays pending until that freeze ends.
    pub fn apply_provider_pressure(&mut self, hpa: f64) -> f64 {
        let kpa = hpa / 10.0;
        self.estimator
            .reference_mut()
            .frozen(|guard| guard.set_reference(kpa));
        kpa
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> MeasureSnapshot {
        MeasureSnapshot {
            status: self.status,
            mode: self.mode,
            sensor_active: self.sensor_active,
            current_reading: self.current_reading,
            gain_meters: self.gain_meters(),
            session: self.session.clone(),
            metrics: self.session.as_ref().map(|session| session.metrics(now)),
            confidence: self.confidence,
            last_completed: self.last_completed.clone(),
            availability_message: self.availability_message.clone(),
            sea_level_pressure_kpa: self.sea_level_pressure_kpa(),
            reference_frozen: self.estimator.reference().is_frozen(),
        }
    }

    pub fn shutdown(&mut self) {
        self.halt_updates();
    }

    fn require_sensor(&mut self) -> Result<(), MeasureError> {
        if self.sensor.is_available() {
            self.availability_message = None;
            Ok(())
        } else {
            self.availability_message = Some(SENSOR_UNAVAILABLE_MESSAGE.to_string());
            self.recompute_confidence(Utc::now());
            Err(MeasureError::SensorUnavailable)
        }
    }

    fn ensure_updates(&mut self) -> Result<(), MeasureError> {
        if self.sensor_active {
            return Ok(());
        }
        self.sensor
            .start_updates(self.readings.clone())
            .map_err(|err| MeasureError::SensorStart(format!("{err:#}")))?;
        self.sensor_active = true;
        Ok(())
    }

    fn halt_updates(&mut self) {
        self.sensor.stop_updates();
        self.sensor_active = false;
    }
}
