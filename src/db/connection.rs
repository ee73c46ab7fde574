use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const WORKER_THREAD_NAME: &str = "howhigh-db";

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum WorkerMessage {
    Run(Job),
    Close,
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Opens the file, switches to WAL and brings the schema up to date.
fn open_session_store(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        log_error!("WAL unavailable for {}, staying on the default journal: {err}", path.display());
    }
    run_migrations(&mut conn).context("failed to migrate session schema")?;
    Ok(conn)
}

fn worker_main(path: PathBuf, inbox: mpsc::Receiver<WorkerMessage>, ready: mpsc::Sender<Result<()>>) {
    let mut conn = match open_session_store(&path) {
        Ok(conn) => conn,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let mut jobs: u64 = 0;
    while let Ok(message) = inbox.recv() {
        match message {
            WorkerMessage::Run(job) => {
                job(&mut conn);
                jobs += 1;
            }
            WorkerMessage::Close => break,
        }
    }
    log_info!("session store worker exiting after {jobs} jobs");
}

struct Worker {
    inbox: Mutex<mpsc::Sender<WorkerMessage>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    fn post(&self, message: WorkerMessage) -> Result<()> {
        lock_ignoring_poison(&self.inbox)
            .send(message)
            .map_err(|_| anyhow!("session store worker has stopped"))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let Some(thread) = lock_ignoring_poison(&self.thread).take() else {
            return;
        };
        if let Err(err) = self.post(WorkerMessage::Close) {
            log_error!("could not close session store worker: {err}");
        }
        if thread.join().is_err() {
            log_error!("session store worker panicked");
        }
    }
}

/// Session database. One worker thread owns the SQLite connection and runs
/// queued closures in order; clones share that worker, and the last clone
/// dropped closes it.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let (inbox_tx, inbox_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path = db_path.clone();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || worker_main(path, inbox_rx, ready_tx))
            .context("failed to spawn session store worker")?;

        ready_rx
            .recv()
            .context("session store worker exited during startup")??;
        log_info!("session store ready at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                inbox: Mutex::new(inbox_tx),
                thread: Mutex::new(Some(thread)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Runs `task` on the worker thread and waits for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.worker.post(WorkerMessage::Run(Box::new(move |conn| {
            let _ = reply_tx.send(task(conn));
        })))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("session store worker dropped the request"))?
    }

    /// Queues `task` without waiting. Failures are logged on the worker
    /// under `label`.
    pub fn submit<F>(&self, label: &'static str, task: F) -> Result<()>
    where
        F: FnOnce(&mut Connection) -> Result<()> + Send + 'static,
    {
        self.worker.post(WorkerMessage::Run(Box::new(move |conn| {
            if let Err(err) = task(conn) {
                log_error!("{label} failed: {err:#}");
            }
        })))
    }
}
