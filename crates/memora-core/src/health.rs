//! Read-only health aggregation: daemon state, delivery counters derived
//! from persisted queue rows (so they survive restarts), and the process
//! memory footprint. No mutation capability.

use crate::daemon::DaemonStatus;
use crate::error::CoreError;
use crate::models::NotifyMethod;
use crate::notify::DeliveryChain;
use crate::store::{now_local, NotificationQueue, SqliteStore};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub daemon_running: bool,
    pub daemon_pid: Option<u32>,
    pub uptime_seconds: Option<i64>,
    /// Most capable transport that probed available.
    pub active_method: NotifyMethod,
    pub pending: i64,
    pub snoozed: i64,
    pub sent_last_24h: i64,
    pub failed_last_24h: i64,
    pub last_error: Option<String>,
    pub memory_bytes: Option<u64>,
}

pub struct HealthMonitor {
    store: Arc<SqliteStore>,
    chain: Arc<DeliveryChain>,
}

impl HealthMonitor {
    pub fn new(store: Arc<SqliteStore>, chain: Arc<DeliveryChain>) -> Self {
        Self { store, chain }
    }

    pub async fn snapshot(
        &self,
        daemon: &DaemonStatus,
    ) -> Result<HealthSnapshot, CoreError> {
        let now = now_local();
        let stats = self.store.notification_stats(now).await?;

        Ok(HealthSnapshot {
            daemon_running: daemon.running,
            daemon_pid: daemon.pid,
            uptime_seconds: daemon.started_at.map(|t| (now - t).num_seconds()),
            active_method: self.chain.best_method(),
            pending: stats.pending,
            snoozed: stats.snoozed,
            sent_last_24h: stats.sent_last_24h,
            failed_last_24h: stats.failed_last_24h,
            last_error: stats.last_error,
            memory_bytes: process_rss_bytes(),
        })
    }
}

/// Resident set size of the current process, if the platform exposes it.
#[cfg(target_os = "linux")]
pub fn process_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(target_os = "macos")]
pub fn process_rss_bytes() -> Option<u64> {
    let output = std::process::Command::new("ps")
        .args(["-o", "rss=", "-p", &std::process::id().to_string()])
        .output()
        .ok()?;
    let kb: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn process_rss_bytes() -> Option<u64> {
    None
}
