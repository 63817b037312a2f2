//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;

/// Demo exporter - prints records as JSON lines and tracks the export checkpoint
#[derive(Parser, Debug)]
#[command(name = "demo-exporter")]
#[command(version)]
#[command(about = "Print positioned records as JSON lines and persist the export checkpoint")]
#[command(
    long_about = "Reads JSON-lines records, exports every record after the persisted checkpoint to stdout, and acknowledges each exported position so a restart resumes where the last run stopped."
)]
pub struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export records to stdout, resuming after the persisted checkpoint
    Run {
        /// Record file in JSON-lines format, or '-' for stdin
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        host: HostArgs,

        /// Delivery attempts per record before the run stops
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Inspect or reset the persisted checkpoint
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommands {
    /// Print the persisted checkpoint as JSON
    Show {
        #[command(flatten)]
        host: HostArgs,
    },

    /// Delete the persisted checkpoint so the next run starts from the beginning
    Reset {
        #[command(flatten)]
        host: HostArgs,
    },
}

/// Options shared by every command that touches the checkpoint.
#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Host configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Checkpoint file path
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Exporter identifier
    #[arg(long)]
    pub exporter_id: Option<String>,
}

impl HostArgs {
    /// Turn command-line values into config overrides.
    #[must_use]
    pub fn overrides(&self, max_attempts: Option<u32>) -> Overrides {
        Overrides {
            exporter_id: self.exporter_id.clone(),
            checkpoint: self.checkpoint.clone(),
            max_attempts,
        }
    }
}
