//! Directory operations.

use std::path::Path;

use crate::{DirEntry, FsError};

/// Directory operations against virtual paths.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// Enumerate a directory.
    ///
    /// The outer `Result` says whether the directory could be opened; each
    /// item's `Result` whether that entry could be read. Entries come in the
    /// order the backing filesystem yields them. The iterator is lazy, so a
    /// consumer that has seen enough simply stops pulling.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if the path does not exist
    /// - [`FsError::Os`] with `ENOTDIR` if the path is not a directory
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError>;

    /// Create a directory with permission bits `mode` (parent must exist).
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EEXIST` if the path already exists
    fn create_dir(&self, path: &Path, mode: u32) -> Result<(), FsError>;

    /// Remove an empty directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOTEMPTY` if the directory is not empty
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;
}

/// Lazy iterator over directory entries.
///
/// - Outer `Result` (from [`FsDir::read_dir`]) = "can I open this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
///
/// # Example
///
/// ```rust
/// use mirrorfs::{FsDir, FsError};
/// use std::path::Path;
///
/// fn first_names<B: FsDir>(backend: &B, n: usize) -> Result<Vec<String>, FsError> {
///     backend
///         .read_dir(Path::new("/"))?
///         .take(n)
///         .map(|entry| entry.map(|e| e.name.to_string_lossy().into_owned()))
///         .collect()
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<Result<DirEntry, FsError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl std::fmt::Debug for ReadDirIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadDirIter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileType;
    use std::ffi::OsString;

    fn entry(name: &str, inode: u64) -> DirEntry {
        DirEntry {
            name: OsString::from(name),
            inode,
            file_type: Some(FileType::File),
        }
    }

    #[test]
    fn read_dir_iter_preserves_order() {
        let iter = ReadDirIter::from_vec(vec![Ok(entry("b", 2)), Ok(entry("a", 1))]);
        let names: Vec<_> = iter.map(|e| e.unwrap().name).collect();
        assert_eq!(names, vec![OsString::from("b"), OsString::from("a")]);
    }

    #[test]
    fn read_dir_iter_collect_all_error() {
        let iter = ReadDirIter::from_vec(vec![
            Ok(entry("a", 1)),
            Err(FsError::os(
                "readdir",
                "/b",
                std::io::Error::from_raw_os_error(libc::EIO),
            )),
        ]);
        let err = iter.collect_all().unwrap_err();
        assert_eq!(err.errno(), libc::EIO);
    }

    #[test]
    fn read_dir_iter_is_lazy() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let iter = ReadDirIter::new((0..100u64).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(entry("x", i))
        }));
        let first_three: Vec<_> = iter.take(3).collect();
        assert_eq!(first_three.len(), 3);
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn read_dir_iter_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ReadDirIter>();
    }
}
