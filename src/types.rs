//! Core types shared by the operation handlers.

use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The root of the mount always has inode 1 (FUSE convention).
pub const ROOT_INODE: u64 = 1;

/// Type of a filesystem entry, as encoded in the `S_IFMT` bits of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Named pipe.
    Fifo,
    /// Unix domain socket.
    Socket,
    /// Character device.
    CharDevice,
    /// Block device.
    BlockDevice,
}

impl FileType {
    /// Decode the type bits of a `st_mode` value.
    ///
    /// Returns `None` if the type bits are not a known file type.
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & libc::S_IFMT as u32 {
            m if m == libc::S_IFREG as u32 => Some(FileType::File),
            m if m == libc::S_IFDIR as u32 => Some(FileType::Directory),
            m if m == libc::S_IFLNK as u32 => Some(FileType::Symlink),
            m if m == libc::S_IFIFO as u32 => Some(FileType::Fifo),
            m if m == libc::S_IFSOCK as u32 => Some(FileType::Socket),
            m if m == libc::S_IFCHR as u32 => Some(FileType::CharDevice),
            m if m == libc::S_IFBLK as u32 => Some(FileType::BlockDevice),
            _ => None,
        }
    }

    /// Convert a `std` file type into ours.
    pub fn from_std(file_type: std::fs::FileType) -> Option<Self> {
        use std::os::unix::fs::FileTypeExt;

        if file_type.is_file() {
            Some(FileType::File)
        } else if file_type.is_dir() {
            Some(FileType::Directory)
        } else if file_type.is_symlink() {
            Some(FileType::Symlink)
        } else if file_type.is_fifo() {
            Some(FileType::Fifo)
        } else if file_type.is_socket() {
            Some(FileType::Socket)
        } else if file_type.is_char_device() {
            Some(FileType::CharDevice)
        } else if file_type.is_block_device() {
            Some(FileType::BlockDevice)
        } else {
            None
        }
    }
}

/// Metadata of a real path, taken without following symlinks.
///
/// Mirrors the fields of `struct stat` the host runtime needs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Type of the entry.
    pub file_type: FileType,
    /// Permission bits (`st_mode & 0o7777`).
    pub permissions: Permissions,
    /// Inode number on the backing filesystem.
    pub inode: u64,
    /// Number of hard links.
    pub nlink: u64,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Device id for special files.
    pub rdev: u64,
    /// Size in bytes.
    pub size: u64,
    /// Allocated 512-byte blocks.
    pub blocks: u64,
    /// Preferred I/O block size.
    pub block_size: u32,
    /// Last access time.
    pub accessed: SystemTime,
    /// Last modification time.
    pub modified: SystemTime,
    /// Last status change time.
    pub changed: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    /// Full `st_mode`: type bits plus permission bits.
    pub fn mode(&self) -> u32 {
        let type_bits = match self.file_type {
            FileType::File => libc::S_IFREG,
            FileType::Directory => libc::S_IFDIR,
            FileType::Symlink => libc::S_IFLNK,
            FileType::Fifo => libc::S_IFIFO,
            FileType::Socket => libc::S_IFSOCK,
            FileType::CharDevice => libc::S_IFCHR,
            FileType::BlockDevice => libc::S_IFBLK,
        };
        type_bits as u32 | self.permissions.mode()
    }
}

impl From<&std::fs::Metadata> for Metadata {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            // lstat never reports an unknown type on a sane filesystem
            file_type: FileType::from_mode(meta.mode()).unwrap_or(FileType::File),
            permissions: Permissions::from_mode(meta.mode()),
            inode: meta.ino(),
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            rdev: meta.rdev(),
            size: meta.size(),
            blocks: meta.blocks(),
            block_size: meta.blksize() as u32,
            accessed: system_time(meta.atime(), meta.atime_nsec()),
            modified: system_time(meta.mtime(), meta.mtime_nsec()),
            changed: system_time(meta.ctime(), meta.ctime_nsec()),
        }
    }
}

/// Seconds/nanoseconds since the epoch, as stored by `stat`, to `SystemTime`.
fn system_time(secs: i64, nsecs: i64) -> SystemTime {
    let nsecs = nsecs.clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nsecs)
    } else {
        UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0) + Duration::new(0, nsecs)
    }
}

/// A single entry produced while enumerating a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (not a path).
    pub name: OsString,
    /// Inode number on the backing filesystem.
    pub inode: u64,
    /// Type implied by the directory entry, when the filesystem reports one.
    pub file_type: Option<FileType>,
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }
}

/// Filesystem statistics, as returned by `statvfs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatFs {
    /// Filesystem block size.
    pub block_size: u64,
    /// Fragment size; the unit of the block counts.
    pub fragment_size: u64,
    /// Total blocks.
    pub blocks: u64,
    /// Free blocks.
    pub blocks_free: u64,
    /// Free blocks available to unprivileged users.
    pub blocks_available: u64,
    /// Total inodes.
    pub files: u64,
    /// Free inodes.
    pub files_free: u64,
    /// Free inodes available to unprivileged users.
    pub files_available: u64,
    /// Maximum filename length.
    pub max_name_len: u64,
}

/// One of the two timestamps passed to `utimens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Leave the timestamp unchanged (`UTIME_OMIT`).
    Omit,
    /// Set to the current time (`UTIME_NOW`).
    Now,
    /// Set to a specific time.
    At(SystemTime),
}

impl Timestamp {
    /// Encode as a `timespec` for `utimensat`.
    pub(crate) fn to_timespec(self) -> libc::timespec {
        match self {
            Timestamp::Omit => libc::timespec {
                tv_sec: 0,
                tv_nsec: libc::UTIME_OMIT,
            },
            Timestamp::Now => libc::timespec {
                tv_sec: 0,
                tv_nsec: libc::UTIME_NOW,
            },
            Timestamp::At(time) => {
                let (secs, nsecs) = match time.duration_since(UNIX_EPOCH) {
                    Ok(d) => (d.as_secs() as i64, i64::from(d.subsec_nanos())),
                    Err(e) => {
                        // Before the epoch: floor to whole seconds, keep nanos positive.
                        let d = e.duration();
                        let mut secs = -(d.as_secs() as i64);
                        let mut nsecs = i64::from(d.subsec_nanos());
                        if nsecs > 0 {
                            secs -= 1;
                            nsecs = 1_000_000_000 - nsecs;
                        }
                        (secs, nsecs)
                    }
                };
                libc::timespec {
                    tv_sec: secs as libc::time_t,
                    tv_nsec: nsecs as _,
                }
            }
        }
    }
}
