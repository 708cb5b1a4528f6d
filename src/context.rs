//! The mount context: the one piece of state a mounted session carries.
//!
//! A context moves through three states. It is *uninitialized* until
//! [`MountContext::new`] succeeds, *active* for as long as any backend holds
//! it, and *terminated* when the last reference is dropped. There is no
//! transition back and nothing to clean up besides the path itself.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Canonical root directory backing a mount.
///
/// Construct once at startup and share by reference (typically behind an
/// `Arc`) with every handler. The root is never mutated afterwards, so
/// concurrent readers need no synchronization.
#[derive(Debug, PartialEq, Eq)]
pub struct MountContext {
    root: PathBuf,
}

impl MountContext {
    /// Activate a context by canonicalizing `root`.
    ///
    /// # Errors
    ///
    /// - [`FsError::RootUnavailable`] if the path does not exist or cannot be
    ///   resolved
    /// - [`FsError::NotADirectory`] if it resolves to something other than a
    ///   directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let supplied = root.as_ref();
        let root = supplied
            .canonicalize()
            .map_err(|source| FsError::RootUnavailable {
                path: supplied.to_path_buf(),
                source,
            })?;

        if !root.is_dir() {
            return Err(FsError::NotADirectory { path: root });
        }

        tracing::info!(root = %root.display(), "mount context active");
        Ok(Self { root })
    }

    /// The absolute, symlink-free root directory.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
