//! Open/release without handle state.
//!
//! Backends that reopen the real file on every read and write have nothing to
//! remember between `open` and `release`. `open` only proves that the open
//! would succeed; `release` has nothing to release.

use std::path::Path;

use crate::FsError;

/// Open-file lifecycle operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsOpen`.
pub trait FsOpen: Send + Sync {
    /// Check that `path` can be opened with the raw `open(2)` `flags`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with the code `open(2)` would return
    fn open(&self, path: &Path, flags: i32) -> Result<(), FsError>;

    /// Counterpart of [`open`](FsOpen::open).
    ///
    /// # Errors
    ///
    /// Backends without handle state never fail here.
    fn release(&self, path: &Path) -> Result<(), FsError>;
}
