use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::units::DistanceUnit;

pub const DATA_DIR_ENV: &str = "RIDESTATS_HOME";
const DEFAULT_DIR_NAME: &str = ".ridestats";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Display unit for distances, and by extension elevation.
    pub unit: DistanceUnit,
    /// Trips export read when the cache is missing or refreshed.
    pub trips_file: Option<PathBuf>,
    /// Hours before the ride cache is considered stale. Unset keeps it until `--refresh`.
    pub cache_ttl_hours: Option<u64>,
    pub distribution_bucket: f64,
    pub milestones_miles: Vec<f64>,
    pub milestones_km: Vec<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unit: DistanceUnit::Miles,
            trips_file: None,
            cache_ttl_hours: None,
            distribution_bucket: 50.0,
            milestones_miles: vec![1_000.0, 5_000.0, 10_000.0, 24_901.0, 50_000.0],
            milestones_km: vec![1_000.0, 5_000.0, 10_000.0, 20_000.0, 40_075.0, 100_000.0],
        }
    }
}

impl Settings {
    pub fn config_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads settings from `data_dir`, falling back to defaults when no file exists.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::config_path(data_dir);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(Self::config_path(data_dir), content)?;
        Ok(())
    }

    pub fn milestones(&self, unit: DistanceUnit) -> &[f64] {
        match unit {
            DistanceUnit::Miles => &self.milestones_miles,
            DistanceUnit::Km => &self.milestones_km,
        }
    }
}

/// `$RIDESTATS_HOME`, or `~/.ridestats`.
pub fn default_data_dir() -> Result<PathBuf> {
    resolve_data_dir(None, std::env::var_os(DATA_DIR_ENV), dirs::home_dir())
}

/// An explicit directory wins over the environment, which wins over the home directory.
pub fn resolve_data_dir(
    explicit: Option<PathBuf>,
    env: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = env.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home.map(|h| h.join(DEFAULT_DIR_NAME))
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))
}
