//! Error taxonomy for exporter operations.
//!
//! Every failure is explicit and typed. Lifecycle misuse, configuration
//! rejection and per-record export failures are separate variants so the host
//! can decide which ones are worth a redelivery.

use std::path::PathBuf;

use thiserror::Error;

/// Why a single record could not be exported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportCause {
    /// The record could not be rendered to its textual form.
    #[error("render failed: {reason}")]
    Render { reason: String },

    /// The rendered record could not be written to the output destination.
    #[error("emit failed: {reason}")]
    Emit { reason: String },
}

/// Core error type for exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration
    #[error("invalid exporter configuration: {reason}")]
    Configuration { reason: String },

    // Lifecycle
    #[error("exporter is not configured, cannot {operation}")]
    NotConfigured { operation: String },

    #[error("exporter is not open, cannot {operation}")]
    NotOpen { operation: String },

    #[error("exporter is closed, cannot {operation}")]
    Closed { operation: String },

    #[error("exporter is already configured")]
    AlreadyConfigured,

    #[error("exporter is already open")]
    AlreadyOpen,

    // Ordering
    #[error("record position {position} does not advance past checkpoint {checkpoint}")]
    PositionRegression { position: u64, checkpoint: u64 },

    // Export
    #[error("failed to export record at position {position}: {cause}")]
    ExportFailed { position: u64, cause: ExportCause },

    // Checkpoint persistence
    #[error("checkpoint store '{operation}' failed: {reason}")]
    CheckpointStore { operation: String, reason: String },

    // Input
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("TOML parse error: {reason}")]
    TomlParseFailed { reason: String },

    // I/O errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a not-configured lifecycle error for `operation`.
    pub fn not_configured(operation: impl Into<String>) -> Self {
        Self::NotConfigured {
            operation: operation.into(),
        }
    }

    /// Create a not-open lifecycle error for `operation`.
    pub fn not_open(operation: impl Into<String>) -> Self {
        Self::NotOpen {
            operation: operation.into(),
        }
    }

    /// Create a closed lifecycle error for `operation`.
    pub fn closed(operation: impl Into<String>) -> Self {
        Self::Closed {
            operation: operation.into(),
        }
    }

    /// Create a render failure for the record at `position`.
    pub fn render_failed(position: u64, reason: impl Into<String>) -> Self {
        Self::ExportFailed {
            position,
            cause: ExportCause::Render {
                reason: reason.into(),
            },
        }
    }

    /// Create an emit failure for the record at `position`.
    pub fn emit_failed(position: u64, reason: impl Into<String>) -> Self {
        Self::ExportFailed {
            position,
            cause: ExportCause::Emit {
                reason: reason.into(),
            },
        }
    }

    /// Create a checkpoint store error.
    pub fn checkpoint_store(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CheckpointStore {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True when redelivering the same record may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExportFailed { .. })
    }

    /// Position of the record whose export failed, if this is an export failure.
    #[must_use]
    pub const fn failed_position(&self) -> Option<u64> {
        match self {
            Self::ExportFailed { position, .. } => Some(*position),
            _ => None,
        }
    }
}
