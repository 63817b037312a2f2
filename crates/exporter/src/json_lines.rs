//! Exporter that prints each record as one line of JSON.

use std::io::{self, Write};

use exporter_core::{Error, Result};

use crate::config::Configuration;
use crate::record::{ExportRecord, Position};
use crate::reporter::CheckpointReporter;
use crate::sink::{Exporter, ExporterState};

/// Writes every exported record as a single JSON line to `W`, then
/// acknowledges its position.
///
/// Positions must strictly increase across successful exports. A record at
/// or below the last acknowledged position is rejected without output.
pub struct JsonLinesExporter<W: Write + Send> {
    writer: W,
    state: ExporterState,
    exporter_id: Option<String>,
    reporter: Option<Box<dyn CheckpointReporter>>,
    checkpoint: Option<Position>,
    exported: u64,
}

impl JsonLinesExporter<io::Stdout> {
    /// Create an exporter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesExporter<W> {
    /// Create an exporter writing to `writer`.
    pub const fn with_writer(writer: W) -> Self {
        Self {
            writer,
            state: ExporterState::Unconfigured,
            exporter_id: None,
            reporter: None,
            checkpoint: None,
            exported: 0,
        }
    }

    /// Borrow the output destination.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Give back the output destination.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn id(&self) -> &str {
        self.exporter_id.as_deref().unwrap_or("unconfigured")
    }

    /// Write `line` plus its terminator and flush.
    ///
    /// If the writer fails after accepting part of the line, a lone newline is
    /// written on a best-effort basis so the fragment stays on its own line and
    /// a redelivered record starts cleanly.
    fn emit(&mut self, position: Position, line: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(line.len().saturating_add(1));
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        let mut remaining: &[u8] = &bytes;
        let outcome = loop {
            if remaining.is_empty() {
                break self.writer.flush();
            }
            match self.writer.write(remaining) {
                Ok(0) => break Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => remaining = remaining.get(n..).unwrap_or_default(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };

        outcome.map_err(|e| {
            let torn = !remaining.is_empty() && remaining.len() < bytes.len();
            if torn {
                tracing::warn!(%position, error = %e, "Partial line written; terminating it");
                let repaired = self
                    .writer
                    .write_all(b"\n")
                    .and_then(|()| self.writer.flush());
                if let Err(repair) = repaired {
                    tracing::warn!(%position, error = %repair, "Could not terminate partial line");
                }
            }
            Error::emit_failed(position.value(), e.to_string())
        })
    }
}

impl<W: Write + Send> Exporter for JsonLinesExporter<W> {
    fn configure(&mut self, config: &Configuration) -> Result<()> {
        match self.state {
            ExporterState::Closed => return Err(Error::closed("configure")),
            ExporterState::Configured | ExporterState::Open => {
                return Err(Error::AlreadyConfigured);
            }
            ExporterState::Unconfigured => {}
        }

        config.validate()?;

        self.exporter_id = Some(config.id.clone());
        self.state = ExporterState::Configured;
        tracing::info!(exporter = %config.id, args = config.args.len(), "Exporter configured");
        Ok(())
    }

    fn open(&mut self, reporter: Box<dyn CheckpointReporter>) -> Result<()> {
        match self.state {
            ExporterState::Closed => return Err(Error::closed("open")),
            ExporterState::Unconfigured => return Err(Error::not_configured("open")),
            ExporterState::Open => return Err(Error::AlreadyOpen),
            ExporterState::Configured => {}
        }

        self.reporter = Some(reporter);
        self.state = ExporterState::Open;
        tracing::info!(exporter = %self.id(), "Exporter opened");
        Ok(())
    }

    fn export(&mut self, record: &dyn ExportRecord) -> Result<()> {
        match self.state {
            ExporterState::Closed => return Err(Error::closed("export")),
            ExporterState::Unconfigured | ExporterState::Configured => {
                return Err(Error::not_open("export"));
            }
            ExporterState::Open => {}
        }

        let position = record.position();
        if let Some(checkpoint) = self.checkpoint.filter(|cp| position <= *cp) {
            return Err(Error::PositionRegression {
                position: position.value(),
                checkpoint: checkpoint.value(),
            });
        }

        let line = record.to_json().map_err(|e| match e {
            Error::ExportFailed { .. } => e,
            other => Error::render_failed(position.value(), other.to_string()),
        })?;
        if line.contains('\n') {
            return Err(Error::render_failed(
                position.value(),
                "rendered record spans more than one line",
            ));
        }

        self.emit(position, &line)?;

        self.reporter
            .as_mut()
            .ok_or_else(|| Error::not_open("export"))?
            .report_checkpoint(position)?;

        self.checkpoint = Some(position);
        self.exported = self.exported.saturating_add(1);
        tracing::debug!(exporter = %self.id(), %position, "Record exported");
        Ok(())
    }

    fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        if let Err(e) = self.writer.flush() {
            tracing::warn!(exporter = %self.id(), error = %e, "Failed to flush output on close");
        }
        self.reporter = None;
        self.state = ExporterState::Closed;
        tracing::info!(
            exporter = %self.id(),
            exported = self.exported,
            checkpoint = ?self.checkpoint.map(Position::value),
            "Exporter closed"
        );
    }

    fn state(&self) -> ExporterState {
        self.state
    }

    fn last_checkpoint(&self) -> Option<Position> {
        self.checkpoint
    }
}
