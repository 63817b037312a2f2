//! Result alias and combinators.

use crate::error::Error;

/// The standard Result type for exporter operations.
///
/// All fallible operations in the exporter crates return this type.
///
/// # Examples
///
/// ```ignore
/// fn load(store: &impl CheckpointStore) -> Result<Option<Position>> {
///     Ok(store.load()?.map(|checkpoint| checkpoint.position))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for Results.
pub trait ResultExt<T> {
    /// Inspect the error without consuming the Result.
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn inspect_error<F: FnOnce(&Error)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}
