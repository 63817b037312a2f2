//! The exporter lifecycle contract.
//!
//! A host holds an exporter through this trait and drives it strictly
//! sequentially: `configure`, `open`, `export` any number of times, `close`.

use std::fmt;

use exporter_core::Result;

use crate::config::Configuration;
use crate::record::{ExportRecord, Position};
use crate::reporter::CheckpointReporter;

/// Lifecycle state of an exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExporterState {
    /// Instantiated, no configuration applied.
    Unconfigured,
    /// Configuration accepted, waiting for `open`.
    Configured,
    /// Bound to a reporter and accepting records.
    Open,
    /// Released. Terminal.
    Closed,
}

impl ExporterState {
    /// True once `close` has been called.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ExporterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A record exporter driven by a host.
pub trait Exporter: Send {
    /// Validate and apply the configuration. Must be called once, before
    /// `open`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the configuration is rejected, or a
    /// lifecycle error if called in the wrong state.
    fn configure(&mut self, config: &Configuration) -> Result<()>;

    /// Bind the reporter used to acknowledge exported positions.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotConfigured` before `configure`, `Error::AlreadyOpen`
    /// on a second call and `Error::Closed` after `close`.
    fn open(&mut self, reporter: Box<dyn CheckpointReporter>) -> Result<()>;

    /// Export one record, then acknowledge its position.
    ///
    /// # Errors
    ///
    /// Returns `Error::ExportFailed` if rendering or emission fails; the
    /// checkpoint is not advanced. Returns a lifecycle error outside the
    /// open state.
    fn export(&mut self, record: &dyn ExportRecord) -> Result<()>;

    /// Release resources. Idempotent.
    fn close(&mut self);

    /// Current lifecycle state.
    fn state(&self) -> ExporterState;

    /// Highest position acknowledged during this exporter's lifetime.
    fn last_checkpoint(&self) -> Option<Position>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_closed_is_terminal() {
        assert!(ExporterState::Closed.is_terminal());
        assert!(!ExporterState::Open.is_terminal());
        assert!(!ExporterState::Unconfigured.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ExporterState::Configured.to_string(), "configured");
        assert_eq!(ExporterState::Open.to_string(), "open");
    }
}
