use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rosterwatch_engine::{ApiSettings, AtomicSlotFiles, PersistError, SearchSettings};
use rosterwatch_logging::{rw_info, rw_warn, LogDestination};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "rosterwatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// The `names` lookup endpoint.
    Names,
    /// Everyone on the `leaders` boards.
    Leaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub source: SourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_dir: PathBuf,
    pub quiet_interval_ms: u64,
    pub per_category_cap: usize,
    pub lookup_limit: usize,
    pub request_timeout_ms: u64,
    pub categories: Vec<CategoryConfig>,
    pub log_target: LogTarget,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let search = SearchSettings::default();
        let api = ApiSettings::default();
        Self {
            api_base_url: api.base_url,
            storage_dir: PathBuf::from(".rosterwatch"),
            quiet_interval_ms: search.quiet_interval.as_millis() as u64,
            per_category_cap: search.per_category_cap,
            lookup_limit: search.lookup_limit,
            request_timeout_ms: api.request_timeout.as_millis() as u64,
            categories: vec![
                CategoryConfig {
                    name: "players".to_string(),
                    source: SourceKind::Names,
                },
                CategoryConfig {
                    name: "leaders".to_string(),
                    source: SourceKind::Leaders,
                },
            ],
            log_target: LogTarget::File,
            log_file: PathBuf::from("rosterwatch.log"),
        }
    }
}

impl AppConfig {
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            quiet_interval: Duration::from_millis(self.quiet_interval_ms),
            per_category_cap: self.per_category_cap,
            lookup_limit: self.lookup_limit,
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ApiSettings::default()
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match self.log_target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// Reads the config file. `Ok(None)` when it does not exist.
pub(crate) fn read_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    ron::from_str(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Loads the config, falling back to defaults when missing or unusable.
/// A missing file is created with the defaults so it can be edited.
pub(crate) fn load_config(path: &Path) -> AppConfig {
    match read_config(path) {
        Ok(Some(config)) => {
            rw_info!("Loaded config from {:?}", path);
            config
        }
        Ok(None) => {
            let config = AppConfig::default();
            match save_config(path, &config) {
                Ok(()) => rw_info!("Wrote default config to {:?}", path),
                Err(err) => rw_warn!("Could not write default config to {:?}: {}", path, err),
            }
            config
        }
        Err(err) => {
            rw_warn!("Using default config; {:?} is unusable: {}", path, err);
            AppConfig::default()
        }
    }
}

pub(crate) fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(config, pretty)
        .map_err(|err| ConfigError::Serialize(err.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(CONFIG_FILENAME);
    AtomicSlotFiles::new(dir).write_named(filename, &content)?;
    Ok(())
}
