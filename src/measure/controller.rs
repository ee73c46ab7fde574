use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{error, info};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::atmosphere::SeaLevelObservation;
use crate::models::Session;
use crate::sensing::ReadingReceiver;
use crate::settings::SettingsStore;

use super::error::MeasureError;
use super::pipeline::ReadingPipeline;
use super::state::MeasureSnapshot;

type Reply<T> = oneshot::Sender<T>;

enum MeasureCommand {
    StartMonitoring(Reply<Result<(), MeasureError>>),
    StopMonitoring(Reply<()>),
    Start(Reply<Result<(), MeasureError>>),
    Pause(Reply<Result<(), MeasureError>>),
    Resume(Reply<Result<(), MeasureError>>),
    Stop(Reply<Result<Session, MeasureError>>),
    Calibrate(Reply<Result<(), MeasureError>>),
    SetSeaLevelPressure {
        kpa: f64,
        reply: Reply<Result<f64>>,
    },
    ApplyObservation {
        observation: SeaLevelObservation,
        reply: Reply<Result<f64>>,
    },
    Snapshot(Reply<MeasureSnapshot>),
    Shutdown,
}

/// Cloneable handle to the task that owns a [`ReadingPipeline`].
///
/// Commands and sensor readings are both consumed on that one task, so the
/// pipeline sees every mutation in arrival order.
#[derive(Clone)]
pub struct MeasureController {
    commands: mpsc::UnboundedSender<MeasureCommand>,
    snapshots: watch::Receiver<MeasureSnapshot>,
    task: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl MeasureController {
    /// Must be called from within a tokio runtime. The stored sea-level
    /// reference is applied before the first reading.
    pub fn spawn(
        mut pipeline: ReadingPipeline,
        readings: ReadingReceiver,
        settings: Option<Arc<SettingsStore>>,
    ) -> Result<Self> {
        if let Some(settings) = settings.as_ref() {
            let kpa = settings
                .sea_level_pressure_kpa()
                .context("failed to read stored sea-level pressure")?;
            pipeline.set_sea_level_pressure(kpa);
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(pipeline.snapshot(Utc::now()));

        let runtime = tokio::runtime::Handle::try_current()
            .context("measure controller requires a tokio runtime")?;
        let task = runtime.spawn(run(pipeline, readings, command_rx, snapshot_tx, settings));

        Ok(Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task: Arc::new(std::sync::Mutex::new(Some(task))),
        })
    }

    /// Latest published snapshot.
    pub fn current(&self) -> MeasureSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MeasureSnapshot> {
        self.snapshots.clone()
    }

    pub async fn start_monitoring(&self) -> Result<()> {
        Ok(self.request(MeasureCommand::StartMonitoring).await??)
    }

    pub async fn stop_monitoring(&self) -> Result<()> {
        self.request(MeasureCommand::StopMonitoring).await
    }

    pub async fn start(&self) -> Result<()> {
        Ok(self.request(MeasureCommand::Start).await??)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.request(MeasureCommand::Pause).await??)
    }

    pub async fn resume(&self) -> Result<()> {
        Ok(self.request(MeasureCommand::Resume).await??)
    }

    pub async fn stop(&self) -> Result<Session> {
        Ok(self.request(MeasureCommand::Stop).await??)
    }

    pub async fn calibrate(&self) -> Result<()> {
        Ok(self.request(MeasureCommand::Calibrate).await??)
    }

    /// Stores and applies a manual reference. Returns the value in effect
    /// once the update lands (non-positive input falls back to standard).
    pub async fn set_sea_level_pressure(&self, kpa: f64) -> Result<f64> {
        self.request(|reply| MeasureCommand::SetSeaLevelPressure { kpa, reply })
            .await?
    }

    /// Stores a provider observation and applies it as one frozen update.
    pub async fn apply_observation(&self, observation: SeaLevelObservation) -> Result<f64> {
        self.request(|reply| MeasureCommand::ApplyObservation { observation, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<MeasureSnapshot> {
        self.request(MeasureCommand::Snapshot).await
    }

    /// Stops sensor updates and ends the task. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        let _ = self.commands.send(MeasureCommand::Shutdown);
        let handle = self
            .task
            .lock()
            .map_err(|_| anyhow!("measure task lock poisoned"))?
            .take();
        if let Some(handle) = handle {
            handle.await.context("measure task panicked")?;
        }
        Ok(())
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> MeasureCommand) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .map_err(|_| anyhow!("measure task is not running"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("measure task dropped the request"))
    }
}

async fn run(
    mut pipeline: ReadingPipeline,
    mut readings: ReadingReceiver,
    mut commands: mpsc::UnboundedReceiver<MeasureCommand>,
    snapshots: watch::Sender<MeasureSnapshot>,
    settings: Option<Arc<SettingsStore>>,
) {
    info!("measure task started ({} mode)", pipeline.mode().as_str());

    loop {
        tokio::select! {
            // Commands first, so a stop is never overtaken by queued readings.
            biased;
            command = commands.recv() => {
                let Some(command) = command else { break };
                if !handle_command(&mut pipeline, command, settings.as_ref()).await {
                    break;
                }
            }
            Some(raw) = readings.recv() => {
                if pipeline.handle_raw(raw).is_none() {
                    continue;
                }
            }
        }
        snapshots.send_replace(pipeline.snapshot(Utc::now()));
    }

    pipeline.shutdown();
    snapshots.send_replace(pipeline.snapshot(Utc::now()));
    info!("measure task stopped");
}

/// Returns false when the task should exit.
async fn handle_command(
    pipeline: &mut ReadingPipeline,
    command: MeasureCommand,
    settings: Option<&Arc<SettingsStore>>,
) -> bool {
    match command {
        MeasureCommand::StartMonitoring(reply) => {
            let _ = reply.send(pipeline.start_monitoring());
        }
        MeasureCommand::StopMonitoring(reply) => {
            pipeline.stop_monitoring();
            let _ = reply.send(());
        }
        MeasureCommand::Start(reply) => {
            let _ = reply.send(pipeline.start(Utc::now()));
        }
        MeasureCommand::Pause(reply) => {
            let _ = reply.send(pipeline.pause());
        }
        MeasureCommand::Resume(reply) => {
            let _ = reply.send(pipeline.resume());
        }
        MeasureCommand::Stop(reply) => {
            let _ = reply.send(pipeline.stop(Utc::now()));
        }
        MeasureCommand::Calibrate(reply) => {
            let _ = reply.send(pipeline.calibrate());
        }
        MeasureCommand::SetSeaLevelPressure { kpa, reply } => {
            let result = match settings {
                Some(settings) => {
                    let settings = Arc::clone(settings);
                    blocking(move || settings.set_sea_level_pressure_kpa(kpa)).await
                }
                None => Ok(kpa),
            };
            if let Ok(stored) = result {
                pipeline.set_sea_level_pressure(stored);
            }
            let _ = reply.send(result);
        }
        MeasureCommand::ApplyObservation { observation, reply } => {
            // Readings queue behind this command, and the freeze keeps the
            // reference intact until settings and pipeline agree.
            pipeline.begin_reference_freeze();
            let result = match settings {
                Some(settings) => {
                    let settings = Arc::clone(settings);
                    let hpa = observation.sea_level_pressure_hpa;
                    let at = observation.timestamp;
                    blocking(move || settings.apply_provider_sea_level_pressure(hpa, at))
                        .await
                        .map(|kpa| {
                            pipeline.set_sea_level_pressure(kpa);
                            kpa
                        })
                }
                None => Ok(pipeline.apply_provider_pressure(observation.sea_level_pressure_hpa)),
            };
            pipeline.end_reference_freeze();
            if let Err(err) = &result {
                error!("failed to apply provider pressure: {err:#}");
            }
            let _ = reply.send(result);
        }
        MeasureCommand::Snapshot(reply) => {
            let _ = reply.send(pipeline.snapshot(Utc::now()));
        }
        MeasureCommand::Shutdown => return false,
    }
    true
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| anyhow!("settings task failed: {err}"))?
}
