//! Checkpoint reporting from the exporter back to the host.

use std::sync::Arc;

use parking_lot::Mutex;

use exporter_core::Result;

use crate::record::Position;

/// Handle the exporter uses to acknowledge exported positions.
///
/// Called synchronously from inside `export`, after the record's side
/// effect has completed. The host is responsible for persisting the latest
/// reported value.
pub trait CheckpointReporter: Send {
    /// Acknowledge every record up to and including `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host could not record the checkpoint. The
    /// exporter then treats the position as not acknowledged.
    fn report_checkpoint(&mut self, position: Position) -> Result<()>;
}

impl<R: CheckpointReporter + ?Sized> CheckpointReporter for Box<R> {
    fn report_checkpoint(&mut self, position: Position) -> Result<()> {
        (**self).report_checkpoint(position)
    }
}

/// In-memory reporter that keeps every reported position.
///
/// Clones share the same history, so a host can hand one clone to the
/// exporter and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    history: Arc<Mutex<Vec<Position>>>,
}

impl RecordingReporter {
    /// Create an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently reported position.
    #[must_use]
    pub fn latest(&self) -> Option<Position> {
        self.history.lock().last().copied()
    }

    /// Every reported position, in report order.
    #[must_use]
    pub fn history(&self) -> Vec<Position> {
        self.history.lock().clone()
    }

    /// Number of reports received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// True if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

impl CheckpointReporter for RecordingReporter {
    fn report_checkpoint(&mut self, position: Position) -> Result<()> {
        self.history.lock().push(position);
        Ok(())
    }
}

/// A wrapper that adds tracing to a reporter.
pub struct TracingReporter<R: CheckpointReporter> {
    exporter_id: String,
    inner: R,
}

impl<R: CheckpointReporter> TracingReporter<R> {
    /// Create a new tracing reporter.
    pub fn new(exporter_id: impl Into<String>, inner: R) -> Self {
        Self {
            exporter_id: exporter_id.into(),
            inner,
        }
    }
}

impl<R: CheckpointReporter> CheckpointReporter for TracingReporter<R> {
    fn report_checkpoint(&mut self, position: Position) -> Result<()> {
        tracing::trace!(exporter = %self.exporter_id, %position, "Reporting checkpoint");
        let result = self.inner.report_checkpoint(position);
        if let Err(ref e) = result {
            tracing::warn!(
                exporter = %self.exporter_id,
                %position,
                error = %e,
                "Checkpoint report rejected"
            );
        }
        result
    }
}
