//! Core error types and result combinators shared by the exporter crates.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod result;

pub use error::{Error, ExportCause};
pub use result::{Result, ResultExt};
