//! # Extension Traits
//!
//! Convenience methods layered on the capability traits. They are default
//! methods with blanket implementations, so any backend gets them for free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](FsExt::exists) | `getattr` succeeds |
//! | [`is_file`](FsExt::is_file) | Regular file, without following links |
//! | [`is_dir`](FsExt::is_dir) | Directory, without following links |
//! | [`is_symlink`](FsExt::is_symlink) | Symlink itself |
//! | [`read_to_end`](FsExt::read_to_end) | Whole-file read, looping over short reads |
//! | [`write_all_at`](FsExt::write_all_at) | Positioned write, looping over short writes |
//! | [`get_xattr_vec`](FsXattrExt::get_xattr_vec) | Size query, then fetch |
//! | [`list_xattr_names`](FsXattrExt::list_xattr_names) | Size query, fetch, split on NUL |

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::{Fs, FsError, FsXattr};

const CHUNK: usize = 64 * 1024;

/// Extension methods for any filesystem backend.
///
/// # Example
///
/// ```rust
/// use mirrorfs::{Fs, FsExt, FsError};
/// use std::path::Path;
///
/// fn append_line<B: Fs>(backend: &B, path: &Path, line: &str) -> Result<(), FsError> {
///     let end = if backend.exists(path)? { backend.metadata(path)?.size } else { 0 };
///     backend.write_all_at(path, line.as_bytes(), end)
/// }
/// ```
pub trait FsExt: Fs {
    /// Returns `Ok(false)` for `ENOENT`, `Err` for any other failure.
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path is a regular file. Missing paths are `Ok(false)`.
    fn is_file(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path is a directory. Missing paths are `Ok(false)`.
    fn is_dir(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path is itself a symbolic link. Missing paths are
    /// `Ok(false)`.
    fn is_symlink(&self, path: &Path) -> Result<bool, FsError> {
        match self.metadata(path) {
            Ok(m) => Ok(m.is_symlink()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a whole file by repeated positioned reads until one returns zero.
    ///
    /// # Errors
    ///
    /// Whatever [`FsRead::read`](crate::FsRead::read) returns.
    fn read_to_end(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let mut data = Vec::new();
        let mut chunk = vec![0u8; CHUNK];
        loop {
            let n = self.read(path, &mut chunk, data.len() as u64)?;
            if n == 0 {
                return Ok(data);
            }
            data.extend_from_slice(&chunk[..n]);
        }
    }

    /// Write all of `data` at `offset`, retrying short writes.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `EIO` if a write makes no progress
    /// - whatever [`FsWrite::write`](crate::FsWrite::write) returns
    fn write_all_at(&self, path: &Path, mut data: &[u8], mut offset: u64) -> Result<(), FsError> {
        while !data.is_empty() {
            let n = self.write(path, data, offset)?;
            if n == 0 {
                return Err(FsError::os(
                    "write",
                    path,
                    io::Error::new(io::ErrorKind::WriteZero, "write made no progress"),
                ));
            }
            data = &data[n..];
            offset += n as u64;
        }
        Ok(())
    }
}

impl<B: Fs + ?Sized> FsExt for B {}

/// Owned-buffer wrappers over the [`FsXattr`] size-query protocol.
///
/// # Example
///
/// ```rust
/// use mirrorfs::{FsError, FsXattr, FsXattrExt};
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// fn tag<B: FsXattr>(backend: &B, path: &Path) -> Result<String, FsError> {
///     let raw = backend.get_xattr_vec(path, OsStr::new("user.tag"))?;
///     Ok(String::from_utf8_lossy(&raw).into_owned())
/// }
/// ```
pub trait FsXattrExt: FsXattr {
    /// Fetch an attribute value into a fresh `Vec`.
    ///
    /// The size query and the fetch are two calls; if the value grows in between,
    /// the fetch fails with `ERANGE` and is retried once more.
    fn get_xattr_vec(&self, path: &Path, name: &OsStr) -> Result<Vec<u8>, FsError> {
        fetch(|buf| self.get_xattr(path, name, buf))
    }

    /// List attribute names.
    fn list_xattr_names(&self, path: &Path) -> Result<Vec<OsString>, FsError> {
        let raw = fetch(|buf| self.list_xattr(path, buf))?;
        Ok(raw
            .split(|b| *b == 0)
            .filter(|name| !name.is_empty())
            .map(|name| OsStr::from_bytes(name).to_os_string())
            .collect())
    }
}

impl<B: FsXattr + ?Sized> FsXattrExt for B {}

fn fetch(mut call: impl FnMut(&mut [u8]) -> Result<usize, FsError>) -> Result<Vec<u8>, FsError> {
    let mut attempts = 0;
    loop {
        let size = call(&mut [])?;
        if size == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; size];
        match call(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                return Ok(buf);
            }
            Err(e) if e.errno() == libc::ERANGE && attempts == 0 => attempts += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FsDir, FsLink, FsOpen, FsPermissions, FsRead, FsStats, FsSync, FsWrite, Metadata,
        Permissions, ReadDirIter, StatFs, Timestamp,
    };
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::UNIX_EPOCH;

    /// In-memory single file that reads at most 3 and writes at most 2 bytes
    /// per call.
    struct Dribble {
        data: Mutex<Option<Vec<u8>>>,
    }

    impl Dribble {
        fn with(data: &[u8]) -> Self {
            Self {
                data: Mutex::new(Some(data.to_vec())),
            }
        }

        fn missing() -> Self {
            Self {
                data: Mutex::new(None),
            }
        }

        fn enoent(path: &Path) -> FsError {
            FsError::os("test", path, io::Error::from_raw_os_error(libc::ENOENT))
        }
    }

    impl FsRead for Dribble {
        fn metadata(&self, path: &Path) -> Result<Metadata, FsError> {
            let guard = self.data.lock().unwrap();
            let data = guard.as_ref().ok_or_else(|| Self::enoent(path))?;
            Ok(Metadata {
                file_type: crate::FileType::File,
                permissions: Permissions::from_mode(0o644),
                inode: 2,
                nlink: 1,
                uid: 0,
                gid: 0,
                rdev: 0,
                size: data.len() as u64,
                blocks: 0,
                block_size: 4096,
                accessed: UNIX_EPOCH,
                modified: UNIX_EPOCH,
                changed: UNIX_EPOCH,
            })
        }

        fn access(&self, _: &Path, _: i32) -> Result<(), FsError> {
            Ok(())
        }

        fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
            Err(Self::enoent(path))
        }

        fn read(&self, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
            let guard = self.data.lock().unwrap();
            let data = guard.as_ref().ok_or_else(|| Self::enoent(path))?;
            let start = (offset as usize).min(data.len());
            let n = buf.len().min(3).min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            Ok(n)
        }
    }

    impl FsWrite for Dribble {
        fn write(&self, path: &Path, data: &[u8], offset: u64) -> Result<usize, FsError> {
            let mut guard = self.data.lock().unwrap();
            let file = guard.as_mut().ok_or_else(|| Self::enoent(path))?;
            let n = data.len().min(2);
            let end = offset as usize + n;
            if file.len() < end {
                file.resize(end, 0);
            }
            file[offset as usize..end].copy_from_slice(&data[..n]);
            Ok(n)
        }

        fn truncate(&self, _: &Path, _: u64) -> Result<(), FsError> {
            Ok(())
        }

        fn mknod(&self, _: &Path, _: u32, _: u64) -> Result<(), FsError> {
            Ok(())
        }

        fn remove_file(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsDir for Dribble {
        fn read_dir(&self, _: &Path) -> Result<ReadDirIter, FsError> {
            Ok(ReadDirIter::from_vec(vec![]))
        }

        fn create_dir(&self, _: &Path, _: u32) -> Result<(), FsError> {
            Ok(())
        }

        fn remove_dir(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsLink for Dribble {
        fn symlink(&self, _: &Path, _: &Path) -> Result<(), FsError> {
            Ok(())
        }

        fn hard_link(&self, _: &Path, _: &Path) -> Result<(), FsError> {
            Ok(())
        }

        fn rename(&self, _: &Path, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsPermissions for Dribble {
        fn set_permissions(&self, _: &Path, _: Permissions) -> Result<(), FsError> {
            Ok(())
        }

        fn set_owner(&self, _: &Path, _: Option<u32>, _: Option<u32>) -> Result<(), FsError> {
            Ok(())
        }

        fn set_times(&self, _: &Path, _: Timestamp, _: Timestamp) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsStats for Dribble {
        fn statfs(&self, _: &Path) -> Result<StatFs, FsError> {
            Ok(StatFs::default())
        }
    }

    impl FsOpen for Dribble {
        fn open(&self, _: &Path, _: i32) -> Result<(), FsError> {
            Ok(())
        }

        fn release(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl FsSync for Dribble {
        fn fsync(&self, _: &Path, _: bool) -> Result<(), FsError> {
            Ok(())
        }
    }

    /// Serves a fixed attribute list; `user.grow` reports a smaller size on
    /// the size query than on the fetch the first time round.
    struct Attrs {
        queries: Mutex<usize>,
    }

    impl FsXattr for Attrs {
        fn set_xattr(&self, _: &Path, _: &OsStr, _: &[u8], _: i32) -> Result<(), FsError> {
            Ok(())
        }

        fn get_xattr(&self, path: &Path, name: &OsStr, buf: &mut [u8]) -> Result<usize, FsError> {
            let value: &[u8] = match name.as_bytes() {
                b"user.tag" => b"blue",
                b"user.empty" => b"",
                b"user.grow" => {
                    let mut queries = self.queries.lock().unwrap();
                    if buf.is_empty() {
                        *queries += 1;
                        return Ok(if *queries == 1 { 2 } else { 5 });
                    }
                    b"grown"
                }
                _ => {
                    return Err(FsError::os(
                        "getxattr",
                        path,
                        io::Error::from_raw_os_error(libc::ENODATA),
                    ));
                }
            };
            if buf.is_empty() {
                return Ok(value.len());
            }
            if buf.len() < value.len() {
                return Err(FsError::os(
                    "getxattr",
                    path,
                    io::Error::from_raw_os_error(libc::ERANGE),
                ));
            }
            buf[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }

        fn list_xattr(&self, _: &Path, buf: &mut [u8]) -> Result<usize, FsError> {
            let names = b"user.tag\0user.empty\0";
            if !buf.is_empty() {
                buf[..names.len()].copy_from_slice(names);
            }
            Ok(names.len())
        }

        fn remove_xattr(&self, _: &Path, _: &OsStr) -> Result<(), FsError> {
            Ok(())
        }
    }

    fn attrs() -> Attrs {
        Attrs {
            queries: Mutex::new(0),
        }
    }

    #[test]
    fn read_to_end_loops_over_short_reads() {
        let fs = Dribble::with(b"hello world");
        assert_eq!(fs.read_to_end(Path::new("/f")).unwrap(), b"hello world");
    }

    #[test]
    fn read_to_end_of_empty_file() {
        let fs = Dribble::with(b"");
        assert!(fs.read_to_end(Path::new("/f")).unwrap().is_empty());
    }

    #[test]
    fn write_all_at_loops_over_short_writes() {
        let fs = Dribble::with(b"");
        fs.write_all_at(Path::new("/f"), b"abcde", 3).unwrap();
        assert_eq!(fs.read_to_end(Path::new("/f")).unwrap(), b"\0\0\0abcde");
    }

    #[test]
    fn exists_and_type_checks() {
        let fs = Dribble::with(b"x");
        assert!(fs.exists(Path::new("/f")).unwrap());
        assert!(fs.is_file(Path::new("/f")).unwrap());
        assert!(!fs.is_dir(Path::new("/f")).unwrap());
        assert!(!fs.is_symlink(Path::new("/f")).unwrap());
    }

    #[test]
    fn missing_path_is_false_not_error() {
        let fs = Dribble::missing();
        assert!(!fs.exists(Path::new("/f")).unwrap());
        assert!(!fs.is_file(Path::new("/f")).unwrap());
        assert!(!fs.is_dir(Path::new("/f")).unwrap());
    }

    #[test]
    fn fs_ext_available_on_dyn_fs() {
        let backend = Dribble::with(b"abc");
        let fs: &dyn Fs = &backend;
        assert!(fs.is_file(Path::new("/f")).unwrap());
    }

    #[test]
    fn get_xattr_vec_sizes_then_fetches() {
        let fs = attrs();
        let value = fs
            .get_xattr_vec(Path::new("/f"), OsStr::new("user.tag"))
            .unwrap();
        assert_eq!(value, b"blue");
        let empty = fs
            .get_xattr_vec(Path::new("/f"), OsStr::new("user.empty"))
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn get_xattr_vec_retries_when_value_grows() {
        let fs = attrs();
        let value = fs
            .get_xattr_vec(Path::new("/f"), OsStr::new("user.grow"))
            .unwrap();
        assert_eq!(value, b"grown");
    }

    #[test]
    fn get_xattr_vec_propagates_missing() {
        let fs = attrs();
        let err = fs
            .get_xattr_vec(Path::new("/f"), OsStr::new("user.none"))
            .unwrap_err();
        assert_eq!(err.errno(), libc::ENODATA);
    }

    #[test]
    fn list_xattr_names_splits_on_nul() {
        let fs = attrs();
        let names = fs.list_xattr_names(Path::new("/f")).unwrap();
        assert_eq!(names, vec![OsString::from("user.tag"), OsString::from("user.empty")]);
    }
}
