//! Space pre-allocation.

use std::path::Path;

use crate::FsError;

/// Pre-allocation of file space (`fallocate`).
///
/// Optional: platforms without `posix_fallocate` leave this operation out of
/// the operation table.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsAllocate`.
pub trait FsAllocate: Send + Sync {
    /// Ensure `len` bytes starting at `offset` are allocated.
    ///
    /// Only the default mode (`0`) is supported.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotSupported`] if `mode` is nonzero; the file is not
    ///   touched
    /// - [`FsError::Os`] with `ENOSPC` if the space cannot be reserved
    fn allocate(&self, path: &Path, mode: i32, offset: u64, len: u64) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_allocate_is_object_safe() {
        fn _check(_: &dyn FsAllocate) {}
    }
}
