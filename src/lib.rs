#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # demo-exporter
//!
//! Host side of the demo exporter: CLI definitions, host configuration and
//! the command handlers that drive a JSON-lines exporter over a record file.

pub mod cli;
pub mod commands;
pub mod config;

pub use exporter;
