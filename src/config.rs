//! Host configuration loaded from TOML.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use exporter::{Configuration, DEFAULT_MAX_ATTEMPTS, Error, Result};

/// Default location of the checkpoint file.
pub const DEFAULT_CHECKPOINT_PATH: &str = ".exporter/checkpoint.json";

/// Configuration for the demo exporter host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Configuration handed to the exporter's `configure`.
    #[serde(default)]
    pub exporter: Configuration,

    /// Where the acknowledged position is persisted.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Delivery behavior.
    #[serde(default)]
    pub host: DeliveryConfig,
}

/// Checkpoint persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Path of the checkpoint file.
    #[serde(default = "default_checkpoint_path")]
    pub path: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
        }
    }
}

/// Record delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Delivery attempts per record before the run stops.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub exporter_id: Option<String>,
    pub checkpoint: Option<PathBuf>,
    pub max_attempts: Option<u32>,
}

impl HostConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlParseFailed` if the text does not match the schema.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::toml_parse_failed(e.to_string()))
    }

    /// Load from `path` if given, otherwise start from defaults, then apply
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the result is invalid.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let base = path.map_or_else(|| Ok(Self::default()), Self::load)?;
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(id) = overrides.exporter_id {
            self.exporter.id = id;
        }
        if let Some(path) = overrides.checkpoint {
            self.checkpoint.path = path;
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.host.max_attempts = max_attempts;
        }
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if any setting is unusable.
    pub fn validate(&self) -> Result<()> {
        self.exporter.validate()?;

        if self.checkpoint.path.as_os_str().is_empty() {
            return Err(Error::configuration("checkpoint path must not be empty"));
        }

        if self.host.max_attempts == 0 {
            return Err(Error::configuration("max_attempts must be greater than 0"));
        }

        Ok(())
    }
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(DEFAULT_CHECKPOINT_PATH)
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
