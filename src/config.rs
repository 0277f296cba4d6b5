/// Data root resolution and the per-installation configuration file.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::zone::CalendarZone;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LOVEMETER_DATA_DIR";

/// File name of the configuration inside the data root
pub const CONFIG_FILENAME: &str = "config.json";

pub fn resolve_data_root() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    Ok(PathBuf::from(".lovemeter"))
}

/// Events at or before this instant predate the love meter and are ignored.
pub fn default_cutoff() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_utc_offset() -> String {
    "UTC".to_string()
}

/// A date worth counting days from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub label: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Events at or before this instant are excluded from the counters
    #[serde(default = "default_cutoff")]
    pub cutoff: DateTime<Utc>,

    /// Calendar used for day/week/month/year bucketing ("UTC" or "+HH:MM")
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            utc_offset: default_utc_offset(),
            milestones: Vec::new(),
        }
    }
}

impl Config {
    /// Load `config.json` from the data root, or defaults when it does not exist
    pub fn load(data_root: &Path) -> Result<Self> {
        let config_file = data_root.join(CONFIG_FILENAME);
        if !config_file.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_file)
            .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_file.display()))?;

        // Fail early on a bad zone rather than at first use
        config.zone()?;
        Ok(config)
    }

    pub fn save(&self, data_root: &Path) -> Result<()> {
        fs::create_dir_all(data_root).context("Failed to create data directory")?;
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(data_root.join(CONFIG_FILENAME), contents)
            .context("Failed to write config file")?;
        Ok(())
    }

    pub fn zone(&self) -> Result<CalendarZone> {
        CalendarZone::parse(&self.utc_offset)
            .with_context(|| format!("Invalid utc_offset in config: {}", self.utc_offset))
    }
}

// Mutex to ensure tests that modify environment variables don't run concurrently
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
