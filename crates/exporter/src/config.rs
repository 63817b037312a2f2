//! Exporter configuration handed to `configure`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use exporter_core::{Error, Result};

/// Identifier used when no exporter id is configured.
pub const DEFAULT_EXPORTER_ID: &str = "demo";

/// Configuration supplied by the host at `configure` time.
///
/// `args` is opaque to the host. Each exporter decides which keys it
/// understands via [`Configuration::args_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Exporter identifier. Checkpoints are persisted under this id.
    #[serde(default = "default_exporter_id")]
    pub id: String,

    /// Exporter-specific arguments.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            id: default_exporter_id(),
            args: Map::new(),
        }
    }
}

impl Configuration {
    /// Create a configuration with the given id and no arguments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: Map::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Check the structural validity every exporter relies on.
    ///
    /// An empty configuration (`{}`) deserializes with the default id
    /// [`DEFAULT_EXPORTER_ID`] and passes. Only an explicitly blank id fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the id is blank.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::configuration("exporter id must not be empty"));
        }
        Ok(())
    }

    /// Deserialize the arguments into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the arguments do not match `T`.
    pub fn args_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.args.clone())).map_err(|e| {
            Error::configuration(format!("arguments of exporter '{}': {e}", self.id))
        })
    }
}

fn default_exporter_id() -> String {
    DEFAULT_EXPORTER_ID.to_string()
}
