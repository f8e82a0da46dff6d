use crate::config::Config;
use anyhow::{anyhow, Result};
use memora_core::daemon::{service, Daemon, PidFile};
use memora_core::notify::DeliveryChain;
use memora_core::store::SqliteStore;
use owo_colors::OwoColorize;
use std::process::Stdio;
use std::sync::Arc;

/// Foreground loop; this is what the service supervisor (or `daemon
/// start`) executes.
pub async fn run(store: Arc<SqliteStore>, config: &Config) -> Result<()> {
    let chain = Arc::new(DeliveryChain::detect());
    let daemon = Daemon::with_config(store, chain, config.daemon_config());

    println!(
        "memora daemon running (PID {}), press Ctrl+C to stop",
        std::process::id()
    );
    daemon.run_foreground().await?;
    Ok(())
}

/// Spawn a detached `memora daemon run` child.
pub fn start() -> Result<()> {
    let pid_file = PidFile::default();
    if let Some(pid) = pid_file.alive_pid() {
        println!("Daemon already running (PID {pid}).");
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    let child = std::process::Command::new(exe)
        .args(["daemon", "run"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("failed to spawn daemon: {e}"))?;

    println!(
        "{} Daemon started (PID {}).",
        "✓".green().bold(),
        child.id()
    );
    Ok(())
}

pub fn stop() -> Result<()> {
    PidFile::default().stop_external()?;
    println!("{} Daemon stopped.", "✓".green().bold());
    Ok(())
}

pub fn restart() -> Result<()> {
    PidFile::default().stop_external()?;
    start()
}

pub fn status() -> Result<()> {
    match PidFile::default().alive_pid() {
        Some(pid) => println!("Daemon: {} (PID {pid})", "running".green().bold()),
        None => println!("Daemon: {}", "stopped".red().bold()),
    }
    Ok(())
}

pub fn install() -> Result<()> {
    service::install()?;
    println!(
        "{} Daemon registered with the service supervisor.",
        "✓".green().bold()
    );
    Ok(())
}

pub fn uninstall() -> Result<()> {
    let _ = PidFile::default().stop_external();
    service::uninstall()?;
    println!(
        "{} Daemon removed from the service supervisor.",
        "✓".green().bold()
    );
    Ok(())
}
