//! Settings file for the console shell.
//!
//! Every section and field is optional; missing values take the library
//! defaults. A missing file is not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use pipeline_core::{PollerConfig, SegmentationOptions};
use pipeline_engine::ClientSettings;
use pipeline_logging::LogDestination;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "pipeline.ron";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings from {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse settings from {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unknown log destination {0:?} (expected file, terminal or both)")]
    LogDestination(String),
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api: ApiSection,
    pub poller: PollerSection,
    pub segmentation: SegmentationSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub segmentation_timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        let defaults = ClientSettings::default();
        Self {
            base_url: defaults.base_url,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            segmentation_timeout_secs: defaults.segmentation_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollerSection {
    pub interval_ms: u64,
    pub auto_start: bool,
    pub show_controls: bool,
}

impl Default for PollerSection {
    fn default() -> Self {
        let defaults = PollerConfig::default();
        Self {
            interval_ms: defaults.interval.as_millis() as u64,
            auto_start: defaults.auto_start,
            show_controls: defaults.show_controls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SegmentationSection {
    pub chunk_size: u32,
    pub overlap: u32,
    pub llm_backend: String,
    pub llm_model: String,
    pub llm_timeout_secs: u32,
}

impl Default for SegmentationSection {
    fn default() -> Self {
        let defaults = SegmentationOptions::default();
        Self {
            chunk_size: defaults.chunk_size,
            overlap: defaults.overlap,
            llm_backend: defaults.llm_backend,
            llm_model: defaults.llm_model,
            llm_timeout_secs: defaults.llm_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub destination: String,
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            destination: "terminal".to_string(),
            level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`, falling back to defaults when the file is absent.
    ///
    /// Returns whether the file existed alongside the settings.
    pub fn load(path: &Path) -> Result<(Self, bool), SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok((Self::default(), false));
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings = ron::from_str(&content).map_err(|err| SettingsError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok((settings, true))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api.base_url.clone(),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
            segmentation_timeout: Duration::from_secs(self.api.segmentation_timeout_secs),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poller.interval_ms.max(1)),
            auto_start: self.poller.auto_start,
            show_controls: self.poller.show_controls,
        }
    }

    pub fn segmentation_options(&self) -> SegmentationOptions {
        SegmentationOptions {
            chunk_size: self.segmentation.chunk_size,
            overlap: self.segmentation.overlap,
            llm_backend: self.segmentation.llm_backend.clone(),
            llm_model: self.segmentation.llm_model.clone(),
            llm_timeout_secs: self.segmentation.llm_timeout_secs,
        }
    }

    pub fn log_destination(&self) -> Result<LogDestination, SettingsError> {
        LogDestination::parse(&self.log.destination)
            .ok_or_else(|| SettingsError::LogDestination(self.log.destination.clone()))
    }

    pub fn log_level(&self) -> Result<LevelFilter, SettingsError> {
        self.log
            .level
            .parse()
            .map_err(|_| SettingsError::LogLevel(self.log.level.clone()))
    }
}
