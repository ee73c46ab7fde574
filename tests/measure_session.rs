use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use howhigh::db::{Database, MemorySessionStore};
use howhigh::measure::{MeasureController, MeasureError, MeasureStatus, ReadingPipeline};
use howhigh::models::{RawReading, SessionMode, SessionState, Trend};
use howhigh::sensing::{reading_channel, ManualSensor, SimulatedSensor};
use howhigh::SensorConfidence;

const P0: f64 = 101.325;

fn pressure_at(altitude_m: f64) -> f64 {
    P0 * (1.0 - altitude_m / 44330.0).powf(1.0 / 0.1903)
}

#[test]
fn hike_with_recalibration_keeps_session_clock() {
    let (sensor, _feed) = ManualSensor::new(true);
    let (tx, _rx) = reading_channel();
    let store = Arc::new(MemorySessionStore::new());
    let mut pipeline =
        ReadingPipeline::new(SessionMode::Altimeter, Box::new(sensor), tx, store.clone());

    let start = Utc::now() - Duration::minutes(10);
    pipeline.start(start).unwrap();

    // 1) Walk up 20 m over 20 s.
    for i in 0..20 {
        let at = start + Duration::seconds(i);
        pipeline.handle_raw(RawReading {
            timestamp: at,
            relative_altitude_meters: i as f64,
            pressure_kpa: pressure_at(300.0 + i as f64),
        });
    }
    assert_eq!(pipeline.current_session().unwrap().samples.len(), 20);

    // 2) Re-zero on the next tick.
    pipeline.calibrate().unwrap();
    assert_eq!(pipeline.confidence().confidence, SensorConfidence::Calibrating);

    // 3) Keep climbing from the new zero.
    for i in 20..30 {
        let at = start + Duration::seconds(i);
        pipeline.handle_raw(RawReading {
            timestamp: at,
            relative_altitude_meters: i as f64,
            pressure_kpa: pressure_at(300.0 + i as f64),
        });
    }

    let session = pipeline.stop(start + Duration::seconds(30)).unwrap();
    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(session.start_date, start);
    assert_eq!(session.samples.len(), 10);
    assert!(session.samples[0].relative_altitude_meters.abs() < 1e-9);
    assert_eq!(session.duration(Utc::now()), Duration::seconds(30));

    let metrics = session.metrics(Utc::now());
    assert!((metrics.total_ascent_meters - 9.0).abs() < 0.1);
    assert_eq!(metrics.total_descent_meters, 0.0);
    assert_eq!(metrics.altitude_trend, Trend::Rising);

    assert_eq!(store.sessions(Some(SessionMode::Altimeter)).len(), 1);
}

#[test]
fn barometer_mode_refuses_calibration_and_tracks_pressure() {
    let (sensor, _feed) = ManualSensor::new(true);
    let (tx, _rx) = reading_channel();
    let mut pipeline = ReadingPipeline::new(
        SessionMode::Barometer,
        Box::new(sensor),
        tx,
        Arc::new(MemorySessionStore::new()),
    );

    assert_eq!(pipeline.calibrate(), Err(MeasureError::CalibrationUnsupported));

    let start = Utc::now();
    pipeline.start(start).unwrap();
    // Falling pressure, 0.1 kPa across 20 s.
    for i in 0..=20 {
        pipeline.handle_raw(RawReading {
            timestamp: start + Duration::seconds(i),
            relative_altitude_meters: 0.0,
            pressure_kpa: 100.5 - 0.005 * i as f64,
        });
    }

    let session = pipeline.stop(start + Duration::seconds(21)).unwrap();
    assert_eq!(session.mode, SessionMode::Barometer);
    assert_eq!(session.pressure_trend(), Trend::Falling);
    assert_eq!(pipeline.confidence().confidence, SensorConfidence::Good);
}

#[tokio::test]
async fn simulated_sensor_session_lands_in_database() {
    let dir = TempDir::new().unwrap();
    let database = Database::new(dir.path().join("howhigh.sqlite3")).unwrap();

    let sensor = SimulatedSensor::new(std::time::Duration::from_millis(20));
    let (tx, rx) = reading_channel();
    let pipeline = ReadingPipeline::new(
        SessionMode::Altimeter,
        Box::new(sensor),
        tx,
        Arc::new(database.clone()),
    );
    let controller = MeasureController::spawn(pipeline, rx, None).unwrap();

    controller.start().await.unwrap();
    let mut updates = controller.subscribe();
    loop {
        let samples = updates
            .borrow_and_update()
            .session
            .as_ref()
            .map_or(0, |s| s.samples.len());
        if samples >= 5 {
            break;
        }
        updates.changed().await.unwrap();
    }

    let session = controller.stop().await.unwrap();
    assert!(session.samples.len() >= 5);
    assert_eq!(controller.current().status, MeasureStatus::Idle);
    assert!(!controller.current().sensor_active);

    // The sink queued the write ahead of this read on the same worker.
    let stored = database.list_sessions(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, session.id);
    assert_eq!(stored[0].samples.len(), session.samples.len());

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn unavailable_sensor_reports_message() {
    let (tx, rx) = reading_channel();
    let pipeline = ReadingPipeline::new(
        SessionMode::Altimeter,
        Box::new(SimulatedSensor::unavailable()),
        tx,
        Arc::new(MemorySessionStore::new()),
    );
    let controller = MeasureController::spawn(pipeline, rx, None).unwrap();

    let err = controller.start().await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<MeasureError>(),
        Some(&MeasureError::SensorUnavailable)
    );
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.status, MeasureStatus::Idle);
    assert!(snapshot.availability_message.is_some());
    assert_eq!(snapshot.confidence.confidence, SensorConfidence::Unavailable);
    assert_eq!(
        controller.current().confidence.confidence,
        SensorConfidence::Unavailable
    );

    controller.shutdown().await.unwrap();
}
