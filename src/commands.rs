//! CLI command handlers.
//!
//! Logs go to stderr through tracing. Stdout carries exported records, and
//! for the checkpoint commands the checkpoint itself.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use exporter::{
    Checkpoint, CheckpointStore, ExportDriver, ExportSummary, FileCheckpointStore,
    JsonLinesExporter, read_records,
};

use crate::cli::{CheckpointCommands, Commands, HostArgs};
use crate::config::HostConfig;

/// Input path meaning standard input.
pub const STDIN_INPUT: &str = "-";

/// Execute a CLI command.
///
/// This is the main command dispatcher that routes to the appropriate handler.
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            input,
            host,
            max_attempts,
        } => cmd_run(&input, &host, max_attempts),

        Commands::Checkpoint { action } => match action {
            CheckpointCommands::Show { host } => cmd_checkpoint_show(&host),
            CheckpointCommands::Reset { host } => cmd_checkpoint_reset(&host),
        },
    }
}

fn resolve_config(host: &HostArgs, max_attempts: Option<u32>) -> Result<HostConfig> {
    HostConfig::resolve(host.config.as_deref(), host.overrides(max_attempts))
        .context("Invalid host configuration")
}

/// Export records from `input` to stdout.
fn cmd_run(input: &str, host: &HostArgs, max_attempts: Option<u32>) -> Result<()> {
    let config = resolve_config(host, max_attempts)?;

    let reader: Box<dyn BufRead> = if input == STDIN_INPUT {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open input '{input}'"))?;
        Box::new(BufReader::new(file))
    };

    let (summary, _) = run_export(&config, reader, io::stdout())?;

    info!(
        exporter = %config.exporter.id,
        exported = summary.exported,
        skipped = summary.skipped,
        checkpoint = ?summary.checkpoint.map(|p| p.value()),
        "Export run finished"
    );

    if let Some(failed) = summary.failed {
        bail!(
            "record at position {} was not exported after {} attempt(s): {}. Checkpoint remains at {}; rerun to redeliver",
            failed.position,
            failed.attempts,
            failed.reason,
            summary
                .checkpoint
                .map_or_else(|| "none".to_string(), |p| p.to_string())
        );
    }

    Ok(())
}

/// Drive a JSON-lines exporter writing to `writer` over `input`, persisting
/// checkpoints to the configured file. Returns the summary and the writer.
///
/// # Errors
///
/// Returns an error if the run cannot start or hits a non-recoverable error.
/// A record that keeps failing is reported in the summary instead.
pub fn run_export<R, W>(config: &HostConfig, input: R, writer: W) -> Result<(ExportSummary, W)>
where
    R: BufRead,
    W: Write + Send,
{
    let store = Arc::new(FileCheckpointStore::new(&config.checkpoint.path));
    let mut driver = ExportDriver::new(
        JsonLinesExporter::with_writer(writer),
        store,
        config.exporter.clone(),
    )
    .with_max_attempts(config.host.max_attempts);

    let summary = driver
        .run(read_records(input))
        .with_context(|| format!("Export run for '{}' failed", config.exporter.id))?;

    Ok((summary, driver.into_exporter().into_writer()))
}

/// Load the persisted checkpoint for the configured exporter.
///
/// # Errors
///
/// Returns an error if the checkpoint file is unreadable.
pub fn load_checkpoint(config: &HostConfig) -> Result<Option<Checkpoint>> {
    let store = FileCheckpointStore::new(&config.checkpoint.path);
    let checkpoint = store
        .load()
        .with_context(|| format!("Failed to read '{}'", config.checkpoint.path.display()))?;

    if let Some(ref stored) = checkpoint {
        if stored.exporter_id != config.exporter.id {
            warn!(
                stored = %stored.exporter_id,
                configured = %config.exporter.id,
                "Checkpoint belongs to a different exporter"
            );
        }
    }

    Ok(checkpoint)
}

/// Print the persisted checkpoint.
fn cmd_checkpoint_show(host: &HostArgs) -> Result<()> {
    let config = resolve_config(host, None)?;

    match load_checkpoint(&config)? {
        Some(checkpoint) => {
            let text = serde_json::to_string_pretty(&checkpoint)
                .context("Failed to render checkpoint")?;
            println!("{text}");
        }
        None => {
            println!(
                "No checkpoint persisted at {}",
                config.checkpoint.path.display()
            );
        }
    }

    Ok(())
}

/// Delete the persisted checkpoint.
fn cmd_checkpoint_reset(host: &HostArgs) -> Result<()> {
    let config = resolve_config(host, None)?;
    let store = FileCheckpointStore::new(&config.checkpoint.path);

    store
        .clear()
        .with_context(|| format!("Failed to reset '{}'", config.checkpoint.path.display()))?;

    info!(
        path = %config.checkpoint.path.display(),
        "Checkpoint reset; next run starts from the first record"
    );
    Ok(())
}
