//! Read-side operations: metadata, permission checks, symlink targets, data.

use std::path::{Path, PathBuf};

use crate::{FsError, Metadata};

/// Read operations against virtual paths.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods take `&self`; the host
/// runtime may call them concurrently on independent paths.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Get metadata for a path without following symlinks (`getattr`).
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if the path does not exist
    fn metadata(&self, path: &Path) -> Result<Metadata, FsError>;

    /// Check whether the caller may access `path` with `mask`
    /// (`R_OK | W_OK | X_OK`, or `F_OK`).
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EACCES` if access is denied
    fn access(&self, path: &Path, mask: i32) -> Result<(), FsError>;

    /// Read the target of a symbolic link, verbatim.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EINVAL` if `path` is not a symlink
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Positioned read into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes actually read. A count smaller than
    /// `buf.len()` is a short read, not an error; zero means end of file.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EISDIR` if the path is a directory
    fn read(&self, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize, FsError>;
}
