//! Checkpointed record export.
//!
//! This crate provides the exporter side of a broker export pipeline. Key pieces:
//!
//! - **Records**: positioned units of data with an opaque JSON rendering
//! - **Exporter**: the `configure` / `open` / `export` / `close` lifecycle
//! - **JSON lines**: an exporter printing one JSON line per record
//! - **Checkpoints**: reporters and durable stores for the acknowledged position
//! - **Driver**: a host loop that resumes from the stored checkpoint
//!
//! # Example
//!
//! ```ignore
//! use exporter::{Configuration, Exporter, JsonLinesExporter, JsonRecord, Position, RecordingReporter};
//! use serde_json::json;
//!
//! let reporter = RecordingReporter::new();
//! let mut sink = JsonLinesExporter::stdout();
//! sink.configure(&Configuration::default())?;
//! sink.open(Box::new(reporter.clone()))?;
//! sink.export(&JsonRecord::new(Position::new(1), json!({"key": "value"})))?;
//! sink.close();
//! assert_eq!(reporter.latest(), Some(Position::new(1)));
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod json_lines;
pub mod record;
pub mod reporter;
pub mod sink;

pub use checkpoint::{
    Checkpoint, CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore, StoreReporter,
};
pub use config::{Configuration, DEFAULT_EXPORTER_ID};
pub use driver::{DEFAULT_MAX_ATTEMPTS, ExportDriver, ExportSummary, FailedRecord};
pub use exporter_core::{Error, ExportCause, Result, ResultExt};
pub use json_lines::JsonLinesExporter;
pub use record::{ExportRecord, JsonRecord, Position, read_records};
pub use reporter::{CheckpointReporter, RecordingReporter, TracingReporter};
pub use sink::{Exporter, ExporterState};
