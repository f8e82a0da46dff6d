//! Background notification scheduler.
//!
//! One dedicated tokio task periodically scans the queue for due rows,
//! renders each into a [`Message`] and pushes it through the delivery
//! chain, writing the outcome back per row. The poll interval adapts to
//! the backlog: idle queues slow the loop down, bursts speed it up.
//!
//! The daemon is an owned service object, not process-global state;
//! independent instances coexist freely, which is what the tests do.

use crate::models::DueNotification;
use crate::notify::{DeliveryChain, Message};
use crate::store::{now_local, NotificationQueue, SqliteStore};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub mod lifecycle;
pub mod service;

pub use lifecycle::PidFile;

use crate::error::CoreError;

/// Scan cadence and batch bounds.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Baseline poll interval.
    pub normal_interval: Duration,
    /// Interval after a scan that found nothing due.
    pub idle_interval: Duration,
    /// Interval after a scan that found more than `fast_threshold` due.
    pub fast_interval: Duration,
    /// Worst-case rows processed per scan.
    pub batch_size: u32,
    pub fast_threshold: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            normal_interval: Duration::from_secs(60),
            idle_interval: Duration::from_secs(300),
            fast_interval: Duration::from_secs(30),
            batch_size: 16,
            fast_threshold: 5,
        }
    }
}

/// Pick the next poll interval from the size of the last due batch.
/// Applied at timer rearm, so a change takes effect one tick later.
pub fn next_interval(due_count: usize, config: &DaemonConfig) -> Duration {
    if due_count == 0 {
        config.idle_interval
    } else if due_count > config.fast_threshold {
        config.fast_interval
    } else {
        config.normal_interval
    }
}

#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub started_at: Option<NaiveDateTime>,
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    started_at: NaiveDateTime,
}

pub struct Daemon {
    store: Arc<SqliteStore>,
    chain: Arc<DeliveryChain>,
    config: DaemonConfig,
    pid_file: PidFile,
    worker: Mutex<Option<Worker>>,
}

impl Daemon {
    pub fn new(store: Arc<SqliteStore>, chain: Arc<DeliveryChain>) -> Self {
        Self::with_config(store, chain, DaemonConfig::default())
    }

    pub fn with_config(
        store: Arc<SqliteStore>,
        chain: Arc<DeliveryChain>,
        config: DaemonConfig,
    ) -> Self {
        Self {
            store,
            chain,
            config,
            pid_file: PidFile::default(),
            worker: Mutex::new(None),
        }
    }

    pub fn with_pid_file(mut self, pid_file: PidFile) -> Self {
        self.pid_file = pid_file;
        self
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Spawn the scan worker. Idempotent: a second start on a running
    /// daemon is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Ok(());
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(&self.store);
        let chain = Arc::clone(&self.chain);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            // first scan immediately, then settle into the adaptive cadence
            loop {
                let due = scan_once(&store, &chain, &config).await;
                let interval = next_interval(due, &config);
                debug!(due, interval_secs = interval.as_secs(), "scan complete");

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("daemon scan loop stopped");
        });

        *worker = Some(Worker {
            shutdown: shutdown_tx,
            handle,
            started_at: now_local(),
        });
        info!("daemon started");
        Ok(())
    }

    /// Stop the scan worker, letting any in-flight batch finish (shutdown
    /// is only observed between scans). Idempotent.
    pub async fn stop(&self) -> Result<(), CoreError> {
        let worker = self.worker.lock().await.take();
        let Some(worker) = worker else {
            return Ok(());
        };

        let _ = worker.shutdown.send(true);
        if let Err(e) = worker.handle.await {
            warn!(error = %e, "daemon worker join failed");
        }
        info!("daemon stopped");
        Ok(())
    }

    pub async fn restart(&self) -> Result<(), CoreError> {
        self.stop().await?;
        self.start().await
    }

    /// Running flag plus pid. Falls back to the pid file so the status of
    /// an out-of-process daemon is visible too.
    pub async fn status(&self) -> DaemonStatus {
        let worker = self.worker.lock().await;
        if let Some(worker) = worker.as_ref() {
            return DaemonStatus {
                running: true,
                pid: Some(std::process::id()),
                started_at: Some(worker.started_at),
            };
        }

        match self.pid_file.alive_pid() {
            Some(pid) => DaemonStatus {
                running: true,
                pid: Some(pid),
                started_at: None,
            },
            None => DaemonStatus::default(),
        }
    }

    /// Run one scan inline, outside the timer loop. Returns the number of
    /// due rows found.
    pub async fn scan_now(&self) -> usize {
        scan_once(&self.store, &self.chain, &self.config).await
    }

    /// Foreground run mode: register the pid file, scan until SIGINT or
    /// SIGTERM, finish the current batch and deregister cleanly.
    pub async fn run_foreground(&self) -> Result<(), CoreError> {
        self.pid_file.write()?;
        self.start().await?;

        wait_for_shutdown_signal().await;
        info!("shutdown signal received");

        self.stop().await?;
        self.pid_file.cleanup()?;
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Render a queue row into a deliverable message: custom notifications
/// carry their own text, task-linked ones borrow the task's.
fn render_message(item: &DueNotification) -> Message {
    let mut message = match (&item.custom_title, &item.task_title) {
        (Some(title), _) => Message::new(
            title.clone(),
            item.custom_body.clone().unwrap_or_else(|| title.clone()),
        ),
        (None, Some(task_title)) => {
            let body = item
                .task_description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| task_title.clone());
            Message::new("Reminder", body).with_subtitle(task_title.clone())
        }
        (None, None) => Message::new("Reminder", "Reminder"),
    };
    message.group = Some("memora-reminders".to_string());
    message
}

/// One scan: fetch the due batch, deliver each row, persist each outcome.
/// Returns the number of due rows, which drives the adaptive interval.
/// A bad row is logged and persisted as failed; it never aborts the batch.
pub(crate) async fn scan_once(
    store: &SqliteStore,
    chain: &DeliveryChain,
    config: &DaemonConfig,
) -> usize {
    let batch = match store.due_batch(now_local(), config.batch_size).await {
        Ok(batch) => batch,
        Err(e) => {
            error!(error = %e, "due-batch query failed");
            return 0;
        }
    };

    let due = batch.len();
    if due > 0 {
        info!(count = due, "processing due notifications");
    }

    for item in batch {
        let message = render_message(&item);
        let outcome = chain
            .deliver_from(item.method, &message)
            .map(|_| ())
            .map_err(|e| e.to_string());

        if let Err(e) = &outcome {
            warn!(id = %item.id, error = %e, "delivery failed");
        }
        if let Err(e) = store.record_outcome(item.id, outcome, now_local()).await {
            error!(id = %item.id, error = %e, "failed to persist delivery outcome");
        }
    }

    due
}
