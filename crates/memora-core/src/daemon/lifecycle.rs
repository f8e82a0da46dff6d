//! Daemon lifecycle plumbing: pid file registration, liveness checks and
//! signalling an out-of-process daemon.

use crate::error::CoreError;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Pid file registration for a running daemon process.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("memora")
            .join("daemon.pid")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Register the current process.
    pub fn write(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pid = std::process::id();
        fs::write(&self.path, pid.to_string())?;
        info!(pid, path = %self.path.display(), "daemon pid file written");
        Ok(())
    }

    /// Deregister; safe to call when nothing is registered.
    pub fn cleanup(&self) -> Result<(), CoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("daemon pid file removed");
        }
        Ok(())
    }

    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Pid of a live registered daemon, if any. A pid file pointing at a
    /// dead process is treated as stale.
    pub fn alive_pid(&self) -> Option<u32> {
        self.read_pid().filter(|pid| process_exists(*pid))
    }

    /// Ask a registered external daemon to stop: SIGTERM, a bounded grace
    /// period, then SIGKILL. No-op when nothing live is registered.
    pub fn stop_external(&self) -> Result<(), CoreError> {
        let Some(pid) = self.read_pid() else {
            return Ok(());
        };
        if !process_exists(pid) {
            warn!(pid, "stale daemon pid file, removing");
            return self.cleanup();
        }

        info!(pid, "stopping daemon with SIGTERM");
        send_term(pid)?;

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while std::time::Instant::now() < deadline {
            if !process_exists(pid) {
                info!(pid, "daemon stopped");
                return self.cleanup();
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        warn!(pid, "daemon did not stop in time, sending SIGKILL");
        send_kill(pid)?;
        self.cleanup()
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[cfg(unix)]
pub fn process_exists(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // null signal: existence check without side effects
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn process_exists(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn send_term(pid: u32) -> Result<(), CoreError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| CoreError::Daemon(format!("failed to signal daemon: {e}")))
}

#[cfg(unix)]
fn send_kill(pid: u32) -> Result<(), CoreError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGKILL)
        .map_err(|e| CoreError::Daemon(format!("failed to kill daemon: {e}")))
}

#[cfg(not(unix))]
fn send_term(_pid: u32) -> Result<(), CoreError> {
    Err(CoreError::Daemon("signalling unsupported on this platform".into()))
}

#[cfg(not(unix))]
fn send_kill(_pid: u32) -> Result<(), CoreError> {
    Err(CoreError::Daemon("signalling unsupported on this platform".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pid_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let pid_file = PidFile::new(dir.path().join("daemon.pid"));

        pid_file.write().unwrap();
        assert_eq!(pid_file.read_pid(), Some(std::process::id()));
        assert_eq!(pid_file.alive_pid(), Some(std::process::id()));

        pid_file.cleanup().unwrap();
        assert_eq!(pid_file.read_pid(), None);
        // idempotent
        pid_file.cleanup().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn current_process_exists() {
        assert!(process_exists(std::process::id()));
        assert!(!process_exists(999_999_999));
    }
}
