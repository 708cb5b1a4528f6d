//! # PathResolver
//!
//! Translation of virtual paths (relative to the mount) into real paths under
//! the root.
//!
//! Translation is plain concatenation: `resolve(root, "/a/b") == root + "/a/b"`.
//! `.` and `..` are passed through untouched; the host runtime hands us
//! already-normalized paths and the OS resolves whatever remains. The only
//! check is the platform path limit, which fails with
//! [`FsError::PathTooLong`] rather than truncating.

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::{FsError, MountContext};

/// Longest real path accepted, including the terminating NUL.
pub const MAX_PATH_LEN: usize = libc::PATH_MAX as usize;

/// Strategy for mapping virtual paths to real paths.
///
/// The passthrough backend is generic over this trait so that tests can route
/// operations through a resolver of their own.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a resolver is shared by every
/// concurrent handler invocation.
pub trait PathResolver: Send + Sync {
    /// Map `virtual_path` to the real path the OS call should use.
    ///
    /// # Errors
    ///
    /// - [`FsError::PathTooLong`] if the result would exceed [`MAX_PATH_LEN`]
    fn resolve(&self, virtual_path: &Path) -> Result<PathBuf, FsError>;
}

impl PathResolver for MountContext {
    #[inline]
    fn resolve(&self, virtual_path: &Path) -> Result<PathBuf, FsError> {
        resolve(self.root(), virtual_path)
    }
}

/// Concatenate `root` and `virtual_path` byte for byte.
///
/// Unlike [`Path::join`], an absolute `virtual_path` does not replace the
/// root.
///
/// # Errors
///
/// - [`FsError::PathTooLong`] if the concatenation plus its NUL terminator
///   does not fit in [`MAX_PATH_LEN`]
pub fn resolve(root: &Path, virtual_path: &Path) -> Result<PathBuf, FsError> {
    let len = root.as_os_str().len() + virtual_path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(FsError::PathTooLong {
            path: virtual_path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }

    let mut real = OsString::with_capacity(len);
    real.push(root.as_os_str());
    real.push(virtual_path.as_os_str());
    Ok(PathBuf::from(real))
}

/// Convert a real path into a C string for libc calls.
///
/// # Errors
///
/// - [`FsError::InvalidPath`] if the path contains an interior NUL
pub(crate) fn to_cstring(path: &Path) -> Result<std::ffi::CString, FsError> {
    std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| FsError::InvalidPath {
        path: path.to_path_buf(),
    })
}
