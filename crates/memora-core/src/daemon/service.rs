//! Registration with the OS service supervisor, so the daemon survives
//! logout/login and is restarted after a crash (but not after a clean
//! exit): a launchd LaunchAgent on macOS, a systemd user unit elsewhere.

use crate::error::CoreError;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

#[cfg(target_os = "macos")]
const LAUNCH_AGENT_LABEL: &str = "com.memora.daemon";
#[cfg(not(target_os = "macos"))]
const SYSTEMD_UNIT: &str = "memora-daemon.service";

fn daemon_binary() -> Result<PathBuf, CoreError> {
    std::env::current_exe()
        .map_err(|e| CoreError::Daemon(format!("cannot resolve daemon binary: {e}")))
}

fn run_supervisor(command: &mut Command) -> Result<(), CoreError> {
    let status = command
        .status()
        .map_err(|e| CoreError::Daemon(format!("failed to run supervisor command: {e}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(CoreError::Daemon(format!(
            "supervisor command failed with {status}"
        )))
    }
}

#[cfg(target_os = "macos")]
fn plist_path() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CoreError::Daemon("cannot determine home directory".into()))?;
    Ok(home
        .join("Library")
        .join("LaunchAgents")
        .join(format!("{LAUNCH_AGENT_LABEL}.plist")))
}

/// Register the daemon for persistent supervision and start it.
#[cfg(target_os = "macos")]
pub fn install() -> Result<(), CoreError> {
    let exe = daemon_binary()?;
    let path = plist_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("memora");
    fs::create_dir_all(&log_dir)?;

    // KeepAlive restarts after a crash only, never after a clean exit.
    let plist = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
        <string>daemon</string>
        <string>run</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <dict>
        <key>SuccessfulExit</key>
        <false/>
        <key>Crashed</key>
        <true/>
    </dict>
    <key>ThrottleInterval</key>
    <integer>10</integer>
    <key>ProcessType</key>
    <string>Background</string>
    <key>StandardOutPath</key>
    <string>{log_dir}/daemon.log</string>
    <key>StandardErrorPath</key>
    <string>{log_dir}/daemon.err</string>
</dict>
</plist>
"#,
        label = LAUNCH_AGENT_LABEL,
        exe = exe.display(),
        log_dir = log_dir.display(),
    );
    fs::write(&path, plist)?;

    run_supervisor(Command::new("launchctl").arg("load").arg(&path))?;
    info!(path = %path.display(), "launch agent installed");
    Ok(())
}

#[cfg(target_os = "macos")]
pub fn uninstall() -> Result<(), CoreError> {
    let path = plist_path()?;
    // the agent may already be unloaded; only the file removal must succeed
    let _ = Command::new("launchctl").arg("unload").arg(&path).status();
    if path.exists() {
        fs::remove_file(&path)?;
    }
    info!("launch agent removed");
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn unit_path() -> Result<PathBuf, CoreError> {
    let config = dirs::config_dir()
        .ok_or_else(|| CoreError::Daemon("cannot determine config directory".into()))?;
    Ok(config.join("systemd").join("user").join(SYSTEMD_UNIT))
}

/// Register the daemon for persistent supervision and start it.
#[cfg(not(target_os = "macos"))]
pub fn install() -> Result<(), CoreError> {
    let exe = daemon_binary()?;
    let path = unit_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Restart=on-failure: restarted after a crash, not after a clean exit.
    let unit = format!(
        r#"[Unit]
Description=Memora reminder daemon

[Service]
ExecStart={exe} daemon run
Restart=on-failure
RestartSec=10

[Install]
WantedBy=default.target
"#,
        exe = exe.display(),
    );
    fs::write(&path, unit)?;

    run_supervisor(Command::new("systemctl").args(["--user", "daemon-reload"]))?;
    run_supervisor(Command::new("systemctl").args(["--user", "enable", "--now", SYSTEMD_UNIT]))?;
    info!(path = %path.display(), "systemd user unit installed");
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn uninstall() -> Result<(), CoreError> {
    // the unit may already be stopped; only the file removal must succeed
    let _ = Command::new("systemctl")
        .args(["--user", "disable", "--now", SYSTEMD_UNIT])
        .status();

    let path = unit_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
        let _ = Command::new("systemctl")
            .args(["--user", "daemon-reload"])
            .status();
    }
    info!("systemd user unit removed");
    Ok(())
}
