//! Write-side operations: data, size, node creation and removal.

use std::path::Path;

use crate::FsError;

/// Write operations against virtual paths.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Positioned write of `data` at `offset`.
    ///
    /// Returns the number of bytes actually written, which may be less than
    /// `data.len()`. The caller decides whether to retry the remainder.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if the file does not exist
    fn write(&self, path: &Path, data: &[u8], offset: u64) -> Result<usize, FsError>;

    /// Set the size of a file, discarding or zero-extending.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EISDIR` if the path is a directory
    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError>;

    /// Create a filesystem node. `mode` carries both the type bits and the
    /// permission bits; `rdev` is only meaningful for device nodes.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EEXIST` if the path already exists
    fn mknod(&self, path: &Path, mode: u32, rdev: u64) -> Result<(), FsError>;

    /// Remove a non-directory entry (`unlink`).
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if the path does not exist
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;
}
