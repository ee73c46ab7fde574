use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{sensing_loop, ReadingGenerator};
use super::source::ReadingSender;

/// Owns at most one acquisition task and its cancellation token.
pub struct SensingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SensingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn start_sensing<G: ReadingGenerator>(
        &mut self,
        generator: G,
        sink: ReadingSender,
        interval: Duration,
    ) -> Result<()> {
        if self.is_active() {
            bail!("sensing already active");
        }
        self.stop_sensing();

        let runtime = tokio::runtime::Handle::try_current()
            .context("sensor acquisition requires a tokio runtime")?;

        let cancel_token = CancellationToken::new();
        let handle = runtime.spawn(sensing_loop(generator, sink, interval, cancel_token.clone()));

        info!("sensor acquisition started ({} ms interval)", interval.as_millis());
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the acquisition task without waiting for it. Idempotent.
    pub fn stop_sensing(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            // Detach; the token already stops it at its next await point.
            drop(handle);
        }
    }
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SensingController {
    fn drop(&mut self) {
        self.stop_sensing();
    }
}
