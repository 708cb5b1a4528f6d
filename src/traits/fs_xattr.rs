//! Extended attribute operations.
//!
//! Extended attributes are name-value pairs attached to files and
//! directories, beyond the standard attributes. Names usually carry a
//! namespace prefix:
//! - `user.*` - User-defined attributes
//! - `system.*` - System-defined attributes (ACLs)
//! - `security.*` - Security labels (SELinux, capabilities)
//! - `trusted.*` - Trusted attributes (require privileges)
//!
//! # Buffer protocol
//!
//! Reads follow the kernel's two-step convention. Calling
//! [`get_xattr`](FsXattr::get_xattr) or [`list_xattr`](FsXattr::list_xattr)
//! with an empty buffer returns the size needed without copying anything.
//! A non-empty buffer that is too small fails with `ERANGE`. See
//! [`FsXattrExt`](crate::FsXattrExt) for owned-`Vec` convenience wrappers.
//!
//! None of these follow symlinks.

use std::ffi::OsStr;
use std::path::Path;

use crate::FsError;

/// Extended attribute operations.
///
/// Optional: the operation table only routes to these when the platform
/// supports extended attributes.
///
/// # Example
///
/// ```rust
/// use mirrorfs::{FsXattr, FsError};
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// fn tag_len<B: FsXattr>(backend: &B, path: &Path) -> Result<usize, FsError> {
///     // Empty buffer: size query.
///     backend.get_xattr(path, OsStr::new("user.tag"), &mut [])
/// }
/// ```
pub trait FsXattr: Send + Sync {
    /// Set an attribute. `flags` is `0`, `XATTR_CREATE` or `XATTR_REPLACE`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EEXIST` if `XATTR_CREATE` and it exists
    /// - [`FsError::Os`] with `ENODATA` if `XATTR_REPLACE` and it does not
    /// - [`FsError::NotSupported`] if the platform has no xattrs
    fn set_xattr(&self, path: &Path, name: &OsStr, value: &[u8], flags: i32)
    -> Result<(), FsError>;

    /// Copy an attribute's value into `buf`, returning its length.
    /// With an empty `buf`, only the length is returned.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENODATA` if the attribute does not exist
    /// - [`FsError::Os`] with `ERANGE` if `buf` is non-empty but too small
    fn get_xattr(&self, path: &Path, name: &OsStr, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Copy the NUL-separated attribute name list into `buf`, returning its
    /// length. With an empty `buf`, only the length is returned.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ERANGE` if `buf` is non-empty but too small
    fn list_xattr(&self, path: &Path, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Remove an attribute.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENODATA` if the attribute does not exist
    fn remove_xattr(&self, path: &Path, name: &OsStr) -> Result<(), FsError>;
}
