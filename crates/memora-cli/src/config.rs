use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use memora_core::daemon::DaemonConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// SQLite database location.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub daemon: DaemonSection,
}

/// Scan cadence knobs for the reminder daemon.
#[derive(Deserialize, Debug)]
pub struct DaemonSection {
    pub normal_interval_secs: u64,
    pub idle_interval_secs: u64,
    pub fast_interval_secs: u64,
    pub batch_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            daemon: DaemonSection::default(),
        }
    }
}

impl Default for DaemonSection {
    fn default() -> Self {
        let defaults = DaemonConfig::default();
        Self {
            normal_interval_secs: defaults.normal_interval.as_secs(),
            idle_interval_secs: defaults.idle_interval.as_secs(),
            fast_interval_secs: defaults.fast_interval.as_secs(),
            batch_size: defaults.batch_size,
        }
    }
}

fn default_database_path() -> String {
    data_dir().join("memora.db").to_string_lossy().into_owned()
}

pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("memora")
}

impl Config {
    /// Layered configuration: the config file, then `MEMORA_*` environment
    /// variables on top.
    pub fn load() -> Result<Self, figment::Error> {
        let config_file = dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("memora")
            .join("config.toml");

        Figment::new()
            .merge(Toml::file(config_file))
            .merge(Env::prefixed("MEMORA_"))
            .extract()
    }

    pub fn daemon_config(&self) -> DaemonConfig {
        DaemonConfig {
            normal_interval: Duration::from_secs(self.daemon.normal_interval_secs),
            idle_interval: Duration::from_secs(self.daemon.idle_interval_secs),
            fast_interval: Duration::from_secs(self.daemon.fast_interval_secs),
            batch_size: self.daemon.batch_size,
            ..DaemonConfig::default()
        }
    }
}
