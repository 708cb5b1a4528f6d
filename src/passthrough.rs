//! The mirror backend: every operation resolves its virtual path(s) and calls
//! the matching primitive on the real filesystem.
//!
//! Nothing is cached. Each read and write reopens the real file, so
//! [`FsOpen::open`] only checks that the open would succeed and
//! [`FsOpen::release`] and [`FsSync::fsync`] have nothing to do.

use std::ffi::{CString, OsStr};
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{DirBuilderExt, DirEntryExt, FileExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::path_resolver::to_cstring;
use crate::{
    DirEntry, FileType, FsAllocate, FsDir, FsError, FsLink, FsOpen, FsPermissions, FsRead,
    FsStats, FsSync, FsWrite, FsXattr, Metadata, MountContext, PathResolver, Permissions,
    ReadDirIter, StatFs, Timestamp,
};

/// Backend that forwards every operation to the tree under a root directory.
///
/// Cloning is cheap; clones share the resolver.
///
/// # Example
///
/// ```rust,no_run
/// use mirrorfs::{FsRead, MountContext, Passthrough};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let context = Arc::new(MountContext::new("/srv/data")?);
/// let fs = Passthrough::new(context);
/// let meta = fs.metadata(Path::new("/"))?;
/// assert!(meta.is_dir());
/// # Ok::<(), mirrorfs::FsError>(())
/// ```
#[derive(Debug)]
pub struct Passthrough<R = MountContext> {
    resolver: Arc<R>,
}

impl<R> Clone for Passthrough<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl Passthrough<MountContext> {
    /// Canonicalize `root` and build a backend over it.
    ///
    /// # Errors
    ///
    /// Same as [`MountContext::new`].
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, FsError> {
        Ok(Self::new(Arc::new(MountContext::new(root)?)))
    }
}

impl<R: PathResolver> Passthrough<R> {
    /// Build a backend over an existing resolver.
    pub fn new(resolver: Arc<R>) -> Self {
        Self { resolver }
    }

    /// The shared resolver.
    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    fn real(&self, path: &Path) -> Result<PathBuf, FsError> {
        self.resolver.resolve(path)
    }
}

/// Turn a libc `-1` return into an error carrying `errno`.
fn check(ret: libc::c_int, operation: &'static str, path: &Path) -> Result<(), FsError> {
    if ret == -1 {
        Err(FsError::last_os(operation, path))
    } else {
        Ok(())
    }
}

/// Same as [`check`] for calls that return a byte count.
#[cfg(target_os = "linux")]
fn check_len(ret: libc::ssize_t, operation: &'static str, path: &Path) -> Result<usize, FsError> {
    if ret < 0 {
        Err(FsError::last_os(operation, path))
    } else {
        Ok(ret as usize)
    }
}

fn to_off_t(value: u64, operation: &'static str, path: &Path) -> Result<libc::off_t, FsError> {
    libc::off_t::try_from(value)
        .map_err(|_| FsError::os(operation, path, io::Error::from_raw_os_error(libc::EFBIG)))
}

#[cfg(target_os = "linux")]
fn xattr_name(name: &OsStr) -> Result<CString, FsError> {
    CString::new(name.as_bytes()).map_err(|_| FsError::InvalidPath { path: name.into() })
}

impl<R: PathResolver> FsRead for Passthrough<R> {
    fn metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), "getattr");
        let meta = fs::symlink_metadata(&real).map_err(|e| FsError::os("getattr", &real, e))?;
        Ok(Metadata::from(&meta))
    }

    fn access(&self, path: &Path, mask: i32) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), mask, "access");
        let c_path = to_cstring(&real)?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the call's duration.
        let ret = unsafe { libc::access(c_path.as_ptr(), mask) };
        check(ret, "access", &real)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), "readlink");
        fs::read_link(&real).map_err(|e| FsError::os("readlink", &real, e))
    }

    fn read(&self, path: &Path, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), offset, len = buf.len(), "read");
        let file = File::open(&real).map_err(|e| FsError::os("read", &real, e))?;
        file.read_at(buf, offset).map_err(|e| FsError::os("read", &real, e))
    }
}

impl<R: PathResolver> FsWrite for Passthrough<R> {
    fn write(&self, path: &Path, data: &[u8], offset: u64) -> Result<usize, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), offset, len = data.len(), "write");
        let file = OpenOptions::new()
            .write(true)
            .open(&real)
            .map_err(|e| FsError::os("write", &real, e))?;
        file.write_at(data, offset).map_err(|e| FsError::os("write", &real, e))
    }

    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), size, "truncate");
        let len = to_off_t(size, "truncate", &real)?;
        let c_path = to_cstring(&real)?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the call's duration.
        let ret = unsafe { libc::truncate(c_path.as_ptr(), len) };
        check(ret, "truncate", &real)
    }

    fn mknod(&self, path: &Path, mode: u32, rdev: u64) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), mode, rdev, "mknod");

        let file_type = mode & libc::S_IFMT as u32;
        if file_type == 0 || file_type == libc::S_IFREG as u32 {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(mode & 0o7777)
                .open(&real)
                .map(drop)
                .map_err(|e| FsError::os("mknod", &real, e))
        } else if file_type == libc::S_IFIFO as u32 {
            let c_path = to_cstring(&real)?;
            // SAFETY: `c_path` is a valid NUL-terminated string for the call's duration.
            let ret = unsafe { libc::mkfifo(c_path.as_ptr(), (mode & 0o7777) as libc::mode_t) };
            check(ret, "mkfifo", &real)
        } else {
            let c_path = to_cstring(&real)?;
            // SAFETY: `c_path` is a valid NUL-terminated string for the call's duration.
            let ret =
                unsafe { libc::mknod(c_path.as_ptr(), mode as libc::mode_t, rdev as libc::dev_t) };
            check(ret, "mknod", &real)
        }
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), "unlink");
        fs::remove_file(&real).map_err(|e| FsError::os("unlink", &real, e))
    }
}

impl<R: PathResolver> FsDir for Passthrough<R> {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), "readdir");
        let entries = fs::read_dir(&real).map_err(|e| FsError::os("readdir", &real, e))?;

        Ok(ReadDirIter::new(entries.map(move |entry| {
            let entry = entry.map_err(|e| FsError::os("readdir", &real, e))?;
            Ok(DirEntry {
                name: entry.file_name(),
                inode: entry.ino(),
                file_type: entry.file_type().ok().and_then(FileType::from_std),
            })
        })))
    }

    fn create_dir(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), mode, "mkdir");
        DirBuilder::new()
            .mode(mode)
            .create(&real)
            .map_err(|e| FsError::os("mkdir", &real, e))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), "rmdir");
        fs::remove_dir(&real).map_err(|e| FsError::os("rmdir", &real, e))
    }
}

impl<R: PathResolver> FsLink for Passthrough<R> {
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        // `target` is link content and is stored untouched.
        let real_link = self.real(link)?;
        tracing::debug!(target = %target.display(), link = %real_link.display(), "symlink");
        std::os::unix::fs::symlink(target, &real_link)
            .map_err(|e| FsError::os("symlink", &real_link, e))
    }

    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError> {
        let real_original = self.real(original)?;
        let real_link = self.real(link)?;
        tracing::debug!(
            original = %real_original.display(),
            link = %real_link.display(),
            "link"
        );
        fs::hard_link(&real_original, &real_link)
            .map_err(|e| FsError::os("link", &real_original, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let real_from = self.real(from)?;
        let real_to = self.real(to)?;
        tracing::debug!(from = %real_from.display(), to = %real_to.display(), "rename");
        fs::rename(&real_from, &real_to).map_err(|e| FsError::os("rename", &real_from, e))
    }
}

impl<R: PathResolver> FsPermissions for Passthrough<R> {
    fn set_permissions(&self, path: &Path, perm: Permissions) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), mode = perm.mode(), "chmod");
        fs::set_permissions(&real, fs::Permissions::from_mode(perm.mode()))
            .map_err(|e| FsError::os("chmod", &real, e))
    }

    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), ?uid, ?gid, "chown");
        std::os::unix::fs::lchown(&real, uid, gid).map_err(|e| FsError::os("chown", &real, e))
    }

    fn set_times(
        &self,
        path: &Path,
        accessed: Timestamp,
        modified: Timestamp,
    ) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), ?accessed, ?modified, "utimens");
        let c_path = to_cstring(&real)?;
        let times = [accessed.to_timespec(), modified.to_timespec()];
        // SAFETY: `c_path` is NUL-terminated and `times` holds exactly two timespecs.
        let ret = unsafe {
            libc::utimensat(
                libc::AT_FDCWD,
                c_path.as_ptr(),
                times.as_ptr(),
                libc::AT_SYMLINK_NOFOLLOW,
            )
        };
        check(ret, "utimens", &real)
    }
}

impl<R: PathResolver> FsStats for Passthrough<R> {
    #[allow(clippy::unnecessary_cast)]
    fn statfs(&self, path: &Path) -> Result<StatFs, FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), "statfs");
        let c_path = to_cstring(&real)?;
        let mut raw = MaybeUninit::<libc::statvfs>::uninit();
        // SAFETY: `c_path` is NUL-terminated and `raw` is valid for writes.
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), raw.as_mut_ptr()) };
        check(ret, "statfs", &real)?;
        // SAFETY: statvfs succeeded and filled the struct.
        let raw = unsafe { raw.assume_init() };

        Ok(StatFs {
            block_size: raw.f_bsize as u64,
            fragment_size: raw.f_frsize as u64,
            blocks: raw.f_blocks as u64,
            blocks_free: raw.f_bfree as u64,
            blocks_available: raw.f_bavail as u64,
            files: raw.f_files as u64,
            files_free: raw.f_ffree as u64,
            files_available: raw.f_favail as u64,
            max_name_len: raw.f_namemax as u64,
        })
    }
}

impl<R: PathResolver> FsOpen for Passthrough<R> {
    fn open(&self, path: &Path, flags: i32) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), flags, "open");

        let mut options = OpenOptions::new();
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => options.read(true),
            libc::O_WRONLY => options.write(true),
            _ => options.read(true).write(true),
        };
        options
            .custom_flags(flags & !libc::O_ACCMODE)
            .open(&real)
            .map(drop)
            .map_err(|e| FsError::os("open", &real, e))
    }

    fn release(&self, path: &Path) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), "release");
        Ok(())
    }
}

impl<R: PathResolver> FsSync for Passthrough<R> {
    fn fsync(&self, path: &Path, datasync: bool) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), datasync, "fsync");
        Ok(())
    }
}

impl<R: PathResolver> FsAllocate for Passthrough<R> {
    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    fn allocate(&self, path: &Path, mode: i32, offset: u64, len: u64) -> Result<(), FsError> {
        use std::os::fd::AsRawFd;

        if mode != 0 {
            return Err(FsError::NotSupported {
                operation: "fallocate",
            });
        }
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), offset, len, "fallocate");
        let offset = to_off_t(offset, "fallocate", &real)?;
        let len = to_off_t(len, "fallocate", &real)?;
        let file = OpenOptions::new()
            .write(true)
            .open(&real)
            .map_err(|e| FsError::os("fallocate", &real, e))?;

        // SAFETY: the descriptor stays open for the duration of the call.
        let code = unsafe { libc::posix_fallocate(file.as_raw_fd(), offset, len) };
        // posix_fallocate returns the error code rather than setting errno.
        if code != 0 {
            return Err(FsError::os(
                "fallocate",
                &real,
                io::Error::from_raw_os_error(code),
            ));
        }
        Ok(())
    }

    #[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
    fn allocate(&self, _path: &Path, _mode: i32, _offset: u64, _len: u64) -> Result<(), FsError> {
        Err(FsError::NotSupported {
            operation: "fallocate",
        })
    }
}

#[cfg(target_os = "linux")]
impl<R: PathResolver> FsXattr for Passthrough<R> {
    fn set_xattr(
        &self,
        path: &Path,
        name: &OsStr,
        value: &[u8],
        flags: i32,
    ) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), name = %name.to_string_lossy(), "setxattr");
        let c_path = to_cstring(&real)?;
        let c_name = xattr_name(name)?;
        // SAFETY: both strings are NUL-terminated; `value` is valid for `value.len()` bytes.
        let ret = unsafe {
            libc::lsetxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                value.as_ptr().cast(),
                value.len(),
                flags,
            )
        };
        check(ret, "setxattr", &real)
    }

    fn get_xattr(&self, path: &Path, name: &OsStr, buf: &mut [u8]) -> Result<usize, FsError> {
        let real = self.real(path)?;
        tracing::trace!(
            real = %real.display(),
            name = %name.to_string_lossy(),
            len = buf.len(),
            "getxattr"
        );
        let c_path = to_cstring(&real)?;
        let c_name = xattr_name(name)?;
        // SAFETY: both strings are NUL-terminated; `buf` is valid for `buf.len()` bytes.
        // A zero length asks only for the size.
        let ret = unsafe {
            libc::lgetxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len(),
            )
        };
        check_len(ret, "getxattr", &real)
    }

    fn list_xattr(&self, path: &Path, buf: &mut [u8]) -> Result<usize, FsError> {
        let real = self.real(path)?;
        tracing::trace!(real = %real.display(), len = buf.len(), "listxattr");
        let c_path = to_cstring(&real)?;
        // SAFETY: `c_path` is NUL-terminated; `buf` is valid for `buf.len()` bytes.
        let ret = unsafe { libc::llistxattr(c_path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
        check_len(ret, "listxattr", &real)
    }

    fn remove_xattr(&self, path: &Path, name: &OsStr) -> Result<(), FsError> {
        let real = self.real(path)?;
        tracing::debug!(real = %real.display(), name = %name.to_string_lossy(), "removexattr");
        let c_path = to_cstring(&real)?;
        let c_name = xattr_name(name)?;
        // SAFETY: both strings are NUL-terminated.
        let ret = unsafe { libc::lremovexattr(c_path.as_ptr(), c_name.as_ptr()) };
        check(ret, "removexattr", &real)
    }
}

#[cfg(not(target_os = "linux"))]
impl<R: PathResolver> FsXattr for Passthrough<R> {
    fn set_xattr(&self, _: &Path, _: &OsStr, _: &[u8], _: i32) -> Result<(), FsError> {
        Err(FsError::NotSupported {
            operation: "setxattr",
        })
    }

    fn get_xattr(&self, _: &Path, _: &OsStr, _: &mut [u8]) -> Result<usize, FsError> {
        Err(FsError::NotSupported {
            operation: "getxattr",
        })
    }

    fn list_xattr(&self, _: &Path, _: &mut [u8]) -> Result<usize, FsError> {
        Err(FsError::NotSupported {
            operation: "listxattr",
        })
    }

    fn remove_xattr(&self, _: &Path, _: &OsStr) -> Result<(), FsError> {
        Err(FsError::NotSupported {
            operation: "removexattr",
        })
    }
}
