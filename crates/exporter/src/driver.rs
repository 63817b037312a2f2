//! Host-side driver: feeds records to an exporter and keeps the durable cursor.
//!
//! The driver plays the broker's part of the export contract. It resumes from
//! the persisted checkpoint, never redelivers an acknowledged position, and
//! stops at the first record it could not export so the checkpoint can never
//! pass over an unexported record.

use std::sync::Arc;

use exporter_core::{Error, Result, ResultExt};

use crate::checkpoint::{CheckpointStore, StoreReporter};
use crate::config::Configuration;
use crate::record::{ExportRecord, Position};
use crate::reporter::TracingReporter;
use crate::sink::Exporter;

/// Default number of delivery attempts per record within one run.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// A record the driver gave up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    /// Position of the record.
    pub position: Position,
    /// Last failure reason.
    pub reason: String,
    /// Delivery attempts made.
    pub attempts: u32,
}

/// Outcome of one driver run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Checkpoint found in the store when the run started.
    pub resumed_from: Option<Position>,
    /// Records exported during this run.
    pub exported: u64,
    /// Records skipped because they were already acknowledged.
    pub skipped: u64,
    /// Checkpoint in the store when the run finished.
    pub checkpoint: Option<Position>,
    /// The record that stopped the run, if any.
    pub failed: Option<FailedRecord>,
}

impl ExportSummary {
    /// True if every delivered record was exported or skipped.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Drives an exporter through its whole lifecycle over a record stream.
pub struct ExportDriver<E: Exporter, S: CheckpointStore + 'static> {
    exporter: E,
    store: Arc<S>,
    config: Configuration,
    max_attempts: u32,
}

impl<E: Exporter, S: CheckpointStore + 'static> ExportDriver<E, S> {
    /// Create a driver for `exporter`, persisting checkpoints into `store`.
    pub const fn new(exporter: E, store: Arc<S>, config: Configuration) -> Self {
        Self {
            exporter,
            store,
            config,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set how many times a failing record is delivered before the run stops.
    /// Values below one are treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Borrow the exporter.
    pub const fn exporter(&self) -> &E {
        &self.exporter
    }

    /// Give back the exporter.
    pub fn into_exporter(self) -> E {
        self.exporter
    }

    /// Run the exporter over `records`.
    ///
    /// The exporter is always closed before this returns, whatever the
    /// outcome. An export failure that persists after `max_attempts` ends the
    /// run early and is reported in the summary rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored checkpoint is unreadable or belongs to
    /// another exporter, if configuration or opening fails, if an input record
    /// is invalid, or if the exporter reports a lifecycle or ordering
    /// violation.
    pub fn run<I, R>(&mut self, records: I) -> Result<ExportSummary>
    where
        I: IntoIterator<Item = Result<R>>,
        R: ExportRecord,
    {
        let result = self.run_open(records);
        self.exporter.close();

        let mut summary = result?;
        summary.checkpoint = self.store.load()?.map(|c| c.position);
        Ok(summary)
    }

    fn run_open<I, R>(&mut self, records: I) -> Result<ExportSummary>
    where
        I: IntoIterator<Item = Result<R>>,
        R: ExportRecord,
    {
        let resumed_from = self.load_checkpoint()?;
        let mut summary = ExportSummary {
            resumed_from,
            ..ExportSummary::default()
        };

        self.exporter.configure(&self.config)?;
        let reporter = TracingReporter::new(
            self.config.id.clone(),
            StoreReporter::new(self.config.id.clone(), Arc::clone(&self.store)),
        );
        self.exporter.open(Box::new(reporter))?;

        tracing::info!(
            exporter = %self.config.id,
            resumed_from = ?resumed_from.map(Position::value),
            "Export run started"
        );

        for record in records {
            let record = record?;
            let position = record.position();

            if resumed_from.is_some_and(|checkpoint| position <= checkpoint) {
                tracing::trace!(%position, "Skipping acknowledged record");
                summary.skipped = summary.skipped.saturating_add(1);
                continue;
            }

            if let Some(failed) = self.deliver(&record)? {
                summary.failed = Some(failed);
                break;
            }
            summary.exported = summary.exported.saturating_add(1);
        }

        Ok(summary)
    }

    fn load_checkpoint(&self) -> Result<Option<Position>> {
        match self.store.load()? {
            Some(checkpoint) if checkpoint.exporter_id != self.config.id => {
                Err(Error::checkpoint_store(
                    "load",
                    format!(
                        "stored checkpoint belongs to exporter '{}', not '{}'",
                        checkpoint.exporter_id, self.config.id
                    ),
                ))
            }
            Some(checkpoint) => Ok(Some(checkpoint.position)),
            None => Ok(None),
        }
    }

    /// Deliver one record, retrying recoverable failures. Returns the failure
    /// once attempts are exhausted; other errors propagate.
    fn deliver<R: ExportRecord>(&mut self, record: &R) -> Result<Option<FailedRecord>> {
        let position = record.position();
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let outcome = self.exporter.export(record).inspect_error(|e| {
                tracing::warn!(%position, attempt = attempts, error = %e, "Export attempt failed");
            });

            match outcome {
                Ok(()) => return Ok(None),
                Err(e) if e.is_recoverable() && attempts < self.max_attempts => {}
                Err(e) if e.is_recoverable() => {
                    tracing::error!(
                        %position,
                        attempts,
                        "Giving up on record; checkpoint stays at the last exported position"
                    );
                    return Ok(Some(FailedRecord {
                        position,
                        reason: e.to_string(),
                        attempts,
                    }));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
