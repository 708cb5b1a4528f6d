//! Error types for the passthrough filesystem.

use std::path::PathBuf;

/// Filesystem error type with contextual variants.
///
/// Every variant maps to exactly one POSIX error code through
/// [`errno`](FsError::errno). The host runtime only ever sees that code,
/// negated (see [`status`](FsError::status)); the remaining context exists for
/// logs.
///
/// # Examples
///
/// ```rust
/// use mirrorfs::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::PathTooLong { path: PathBuf::from("/deep"), len: 5000, max: 4096 };
/// assert_eq!(err.errno(), libc::ENAMETOOLONG);
/// assert_eq!(err.status(), -libc::ENAMETOOLONG);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// A real-filesystem primitive failed.
    #[error("{operation} failed for {path}: {source}")]
    Os {
        /// The operation that failed.
        operation: &'static str,
        /// The real path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error, carrying the raw OS error code.
        #[source]
        source: std::io::Error,
    },

    /// Root plus virtual path would not fit in a platform path.
    #[error("path too long: {path} ({len} >= {max})")]
    PathTooLong {
        /// The virtual path that was being resolved.
        path: PathBuf,
        /// Byte length of the concatenated real path.
        len: usize,
        /// Platform maximum, including the terminating NUL.
        max: usize,
    },

    /// Path contains an interior NUL byte and cannot reach the OS.
    #[error("invalid path: {path}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
    },

    /// Operation exists but does not support the requested mode.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Operation has no handler in the operation table.
    #[error("operation not implemented: {operation}")]
    Unimplemented {
        /// The missing operation.
        operation: &'static str,
    },

    /// The root directory could not be canonicalized at startup.
    #[error("cannot resolve root directory {path}: {source}")]
    RootUnavailable {
        /// The root as supplied on the command line.
        path: PathBuf,
        /// Why canonicalization failed.
        #[source]
        source: std::io::Error,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// The host runtime failed to mount or serve the filesystem.
    #[error("mount failed at {mountpoint}: {source}")]
    Mount {
        /// Where the mount was attempted.
        mountpoint: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error from a real-filesystem primitive.
    pub fn os(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Os {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wrap the current `errno` after a failed libc call.
    pub(crate) fn last_os(operation: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::os(operation, path, std::io::Error::last_os_error())
    }

    /// The positive POSIX error code for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::Os { source, .. }
            | FsError::RootUnavailable { source, .. }
            | FsError::Mount { source, .. } => source.raw_os_error().unwrap_or(libc::EIO),
            FsError::PathTooLong { .. } => libc::ENAMETOOLONG,
            FsError::InvalidPath { .. } => libc::EINVAL,
            FsError::NotSupported { .. } => libc::EOPNOTSUPP,
            FsError::Unimplemented { .. } => libc::ENOSYS,
            FsError::NotADirectory { .. } => libc::ENOTDIR,
        }
    }

    /// The signed status handed to the host runtime: `-errno`.
    #[inline]
    pub fn status(&self) -> i32 {
        -self.errno()
    }

    /// Returns `true` if the underlying code is `ENOENT`.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.errno() == libc::ENOENT
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::Os {
            operation: "io",
            path: PathBuf::new(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_error_keeps_raw_code() {
        let err = FsError::os(
            "lstat",
            "/data/missing",
            std::io::Error::from_raw_os_error(libc::ENOENT),
        );
        assert_eq!(err.errno(), libc::ENOENT);
        assert_eq!(err.status(), -libc::ENOENT);
        assert!(err.is_not_found());
    }

    #[test]
    fn os_error_display_names_operation_and_path() {
        let err = FsError::os(
            "rmdir",
            "/data/x",
            std::io::Error::from_raw_os_error(libc::ENOTEMPTY),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("rmdir failed for /data/x"));
    }

    #[test]
    fn synthetic_io_error_maps_to_eio() {
        let err = FsError::from(std::io::Error::other("no code"));
        assert_eq!(err.errno(), libc::EIO);
    }

    #[test]
    fn fixed_codes() {
        assert_eq!(
            FsError::NotSupported { operation: "fallocate" }.status(),
            -libc::EOPNOTSUPP
        );
        assert_eq!(
            FsError::Unimplemented { operation: "setxattr" }.status(),
            -libc::ENOSYS
        );
        assert_eq!(
            FsError::InvalidPath {
                path: PathBuf::from("a\0b")
            }
            .errno(),
            libc::EINVAL
        );
        assert_eq!(
            FsError::NotADirectory {
                path: PathBuf::from("/etc/passwd")
            }
            .errno(),
            libc::ENOTDIR
        );
    }

    #[test]
    fn root_unavailable_display() {
        let err = FsError::RootUnavailable {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert!(err.to_string().contains("/nope"));
        assert_eq!(err.errno(), libc::ENOENT);
    }
}
