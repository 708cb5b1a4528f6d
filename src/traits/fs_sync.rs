//! Flushing file data.

use std::path::Path;

use crate::FsError;

/// Synchronization operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsSync`.
pub trait FsSync: Send + Sync {
    /// Flush a file's data (and metadata unless `datasync`) to storage.
    ///
    /// A backend that writes straight through to the OS on every call may
    /// treat this as a no-op.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] for underlying I/O errors
    fn fsync(&self, path: &Path, datasync: bool) -> Result<(), FsError>;
}
