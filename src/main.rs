use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};

use howhigh::atmosphere::{AtmosphereStore, Coordinate, FixedLocation, NwsClient, NwsProvider};
use howhigh::db::Database;
use howhigh::metrics::session_insights;
use howhigh::sensing::{reading_channel, SimulatedSensor};
use howhigh::settings::SettingsStore;
use howhigh::{MeasureController, ReadingPipeline, SessionMode};

fn data_dir() -> PathBuf {
    std::env::var_os("HOWHIGH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("howhigh"))
}

/// `HOWHIGH_LOCATION=lat,lon` enables a weather.gov reference lookup.
fn configured_location() -> Option<Result<Coordinate>> {
    let raw = std::env::var("HOWHIGH_LOCATION").ok()?;
    let parsed = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("HOWHIGH_LOCATION must look like 'lat,lon', got '{raw}'"))
        .and_then(|(lat, lon)| {
            Ok(Coordinate::new(
                lat.trim().parse().context("invalid latitude")?,
                lon.trim().parse().context("invalid longitude")?,
            ))
        });
    Some(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    howhigh::init_logging();
    info!("howhigh starting up...");

    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let settings = Arc::new(SettingsStore::new(data_dir.join("settings.json"))?);
    let database = Database::new(data_dir.join("howhigh.sqlite3"))?;

    let sensor = SimulatedSensor::from_env();
    let tick = sensor.interval();
    let (reading_tx, reading_rx) = reading_channel();
    let pipeline = ReadingPipeline::new(
        SessionMode::Altimeter,
        Box::new(sensor),
        reading_tx,
        Arc::new(database.clone()),
    );
    let controller = MeasureController::spawn(pipeline, reading_rx, Some(settings.clone()))?;

    if let Some(location) = configured_location() {
        let location = location?;
        let mut atmosphere = AtmosphereStore::new(
            Arc::new(FixedLocation(location)),
            Arc::new(NwsProvider::new(NwsClient::new())),
        );
        match atmosphere.refresh().await {
            Ok(observation) => {
                let kpa = controller.apply_observation(observation).await?;
                info!("sea-level reference set to {kpa:.3} kPa");
            }
            Err(err) => warn!("keeping stored reference: {err}"),
        }
    }

    controller.start().await?;
    tokio::time::sleep(tick * 12).await;
    controller.calibrate().await?;
    tokio::time::sleep(tick * 8).await;

    let snapshot = controller.snapshot().await?;
    info!(
        "confidence {} over {} readings",
        snapshot.confidence.confidence.as_str(),
        snapshot.confidence.sample_count
    );

    let session = controller.stop().await?;
    let metrics = session.metrics(Utc::now());
    let unit = settings.snapshot()?.preferred_unit;
    info!(
        "session {}: {} samples, +{:.1}{} / -{:.1}{}, pressure trend {}",
        session.id,
        metrics.sample_count,
        unit.converted_altitude(metrics.total_ascent_meters),
        unit.altitude_symbol(),
        unit.converted_altitude(metrics.total_descent_meters),
        unit.altitude_symbol(),
        metrics.pressure_trend.as_str(),
    );
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    let stored = database.list_sessions(Some(SessionMode::Altimeter)).await?;
    info!("{} altimeter sessions stored in {}", stored.len(), database.path().display());

    let insights = session_insights(&stored, Utc::now());
    if let Some(drift) = insights.pressure_drift {
        info!(
            "pressure {} by {:.2} kPa per session on average",
            drift.direction.as_str(),
            drift.mean_change_kpa.abs()
        );
    }
    if let Some(total) = insights.cumulative_ascent {
        info!(
            "{:.0}{} climbed across {} sessions",
            unit.converted_altitude(total.total_ascent_meters),
            unit.altitude_symbol(),
            total.session_count
        );
    }

    controller.shutdown().await?;
    Ok(())
}
