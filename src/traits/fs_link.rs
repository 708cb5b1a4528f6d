//! Symlinks, hard links and renames.

use std::path::Path;

use crate::FsError;

/// Operations that bind names to existing nodes.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLink`.
pub trait FsLink: Send + Sync {
    /// Create a symbolic link at `link` whose content is `target`.
    ///
    /// `target` is link content, not a location: it is stored exactly as
    /// given and never translated. `link` is a virtual path.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EEXIST` if `link` already exists
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError>;

    /// Create a hard link `link` to the existing `original`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if `original` does not exist
    /// - [`FsError::Os`] with `EPERM` if `original` is a directory
    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError>;

    /// Rename `from` to `to`, replacing `to` if the OS allows it.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if `from` does not exist
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;
}
