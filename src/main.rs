//! # demo-exporter
//!
//! Prints positioned records as JSON lines and tracks the export checkpoint.
//!
//! ## Run sequence
//!
//! 1. **Configuration** - Load the host TOML file and apply CLI overrides
//! 2. **Resume** - Read the persisted checkpoint for the exporter id
//! 3. **Export** - Configure and open the exporter, export every record after
//!    the checkpoint to stdout, acknowledging each position as it is written
//! 4. **Close** - Close the exporter, whatever the outcome
//!
//! ## Error Handling
//!
//! A record that cannot be exported stops the run with a non-zero exit code.
//! The checkpoint stays on the last exported record, so rerunning redelivers
//! the failed record.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use demo_exporter::cli::Cli;
use demo_exporter::commands::execute_command;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);

    execute_command(cli.command)
}

/// Initialize tracing subscriber with environment filter.
///
/// Logs are written to stderr; stdout is reserved for exported records.
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
