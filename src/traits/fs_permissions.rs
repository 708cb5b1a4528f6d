//! Permission, ownership and timestamp changes.

use std::path::Path;

use crate::{FsError, Permissions, Timestamp};

/// Attribute-changing operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsPermissions`.
///
/// # Note
///
/// Reading these attributes is done via [`FsRead::metadata`](super::FsRead::metadata).
pub trait FsPermissions: Send + Sync {
    /// Set permission bits (`chmod`). Follows symlinks, as `chmod(2)` does.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EPERM` if the caller does not own the file
    fn set_permissions(&self, path: &Path, perm: Permissions) -> Result<(), FsError>;

    /// Change owner and/or group without following symlinks (`lchown`).
    /// `None` leaves that id unchanged.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EPERM` if the change is not permitted
    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError>;

    /// Set access and modification times with nanosecond precision, without
    /// following symlinks (`utimensat` with `AT_SYMLINK_NOFOLLOW`).
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if the path does not exist
    fn set_times(&self, path: &Path, accessed: Timestamp, modified: Timestamp)
    -> Result<(), FsError>;
}
