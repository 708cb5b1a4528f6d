//! # Operation table
//!
//! The registration surface handed to the host runtime: a fixed set of named
//! operation slots, each bound to a handler or left empty.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`OperationKind`] | The 26 slot names |
//! | [`Capabilities`] | Which optional slots this build can fill |
//! | [`Request`] / [`Reply`] | Host arguments in, payload out |
//! | [`OperationTable`] | Kind → [`Handler`], built once, read-only after |
//! | [`Dispatcher`] | Backend + table; routes a request and reports status |
//!
//! Handlers are plain function pointers over `&dyn FsFull`, so a table is
//! `Copy`-cheap to share and needs no synchronization. An empty slot means
//! "operation unsupported" and surfaces as `ENOSYS`, never as silent success.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::Path;

use crate::{DirEntry, FsError, FsFull, Metadata, Permissions, StatFs, Timestamp};

/// Name of an operation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationKind {
    /// `lstat`.
    Getattr,
    /// `access(2)`.
    Access,
    /// Read a symlink target.
    Readlink,
    /// Enumerate a directory.
    Readdir,
    /// Create a file, FIFO or device node.
    Mknod,
    /// Create a directory.
    Mkdir,
    /// Remove a non-directory.
    Unlink,
    /// Remove an empty directory.
    Rmdir,
    /// Create a symbolic link.
    Symlink,
    /// Rename an entry.
    Rename,
    /// Create a hard link.
    Link,
    /// Change permission bits.
    Chmod,
    /// Change owner and group.
    Chown,
    /// Change file size.
    Truncate,
    /// Change timestamps with nanosecond precision.
    Utimens,
    /// Check that a file can be opened.
    Open,
    /// Positioned read.
    Read,
    /// Positioned write.
    Write,
    /// Filesystem statistics.
    Statfs,
    /// Close an opened file.
    Release,
    /// Flush a file.
    Fsync,
    /// Pre-allocate space.
    Fallocate,
    /// Set an extended attribute.
    Setxattr,
    /// Get an extended attribute.
    Getxattr,
    /// List extended attribute names.
    Listxattr,
    /// Remove an extended attribute.
    Removexattr,
}

impl OperationKind {
    /// Number of slots.
    pub const COUNT: usize = 26;

    /// Every kind, in slot order.
    pub const ALL: [OperationKind; Self::COUNT] = [
        OperationKind::Getattr,
        OperationKind::Access,
        OperationKind::Readlink,
        OperationKind::Readdir,
        OperationKind::Mknod,
        OperationKind::Mkdir,
        OperationKind::Unlink,
        OperationKind::Rmdir,
        OperationKind::Symlink,
        OperationKind::Rename,
        OperationKind::Link,
        OperationKind::Chmod,
        OperationKind::Chown,
        OperationKind::Truncate,
        OperationKind::Utimens,
        OperationKind::Open,
        OperationKind::Read,
        OperationKind::Write,
        OperationKind::Statfs,
        OperationKind::Release,
        OperationKind::Fsync,
        OperationKind::Fallocate,
        OperationKind::Setxattr,
        OperationKind::Getxattr,
        OperationKind::Listxattr,
        OperationKind::Removexattr,
    ];

    /// Stable lowercase name, as used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            OperationKind::Getattr => "getattr",
            OperationKind::Access => "access",
            OperationKind::Readlink => "readlink",
            OperationKind::Readdir => "readdir",
            OperationKind::Mknod => "mknod",
            OperationKind::Mkdir => "mkdir",
            OperationKind::Unlink => "unlink",
            OperationKind::Rmdir => "rmdir",
            OperationKind::Symlink => "symlink",
            OperationKind::Rename => "rename",
            OperationKind::Link => "link",
            OperationKind::Chmod => "chmod",
            OperationKind::Chown => "chown",
            OperationKind::Truncate => "truncate",
            OperationKind::Utimens => "utimens",
            OperationKind::Open => "open",
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Statfs => "statfs",
            OperationKind::Release => "release",
            OperationKind::Fsync => "fsync",
            OperationKind::Fallocate => "fallocate",
            OperationKind::Setxattr => "setxattr",
            OperationKind::Getxattr => "getxattr",
            OperationKind::Listxattr => "listxattr",
            OperationKind::Removexattr => "removexattr",
        }
    }

    /// Slot position in the table.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether `capabilities` allow this slot to be filled.
    pub const fn is_available(self, capabilities: Capabilities) -> bool {
        match self {
            OperationKind::Utimens => capabilities.nanosecond_times,
            OperationKind::Fallocate => capabilities.fallocate,
            OperationKind::Setxattr
            | OperationKind::Getxattr
            | OperationKind::Listxattr
            | OperationKind::Removexattr => capabilities.xattr,
            _ => true,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional platform primitives, resolved at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// `utimensat` is available.
    pub nanosecond_times: bool,
    /// `posix_fallocate` is available.
    pub fallocate: bool,
    /// The `l*xattr` family is available.
    pub xattr: bool,
}

impl Capabilities {
    /// What this build's target supports.
    pub const fn detect() -> Self {
        Self {
            nanosecond_times: cfg!(any(
                target_os = "linux",
                target_os = "android",
                target_os = "freebsd",
                target_os = "macos"
            )),
            fallocate: cfg!(any(target_os = "linux", target_os = "freebsd")),
            xattr: cfg!(target_os = "linux"),
        }
    }

    /// Only the mandatory operations.
    pub const fn none() -> Self {
        Self {
            nanosecond_times: false,
            fallocate: false,
            xattr: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// What a directory filler tells the enumeration after each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillResult {
    /// Keep going.
    Continue,
    /// The consumer's buffer is full; stop without error.
    Full,
}

/// Host arguments for one operation.
///
/// Paths are virtual. Buffers are borrowed from the host for the duration of
/// the call.
pub enum Request<'a> {
    /// See [`OperationKind::Getattr`].
    Getattr {
        /// Virtual path.
        path: &'a Path,
    },
    /// See [`OperationKind::Access`].
    Access {
        /// Virtual path.
        path: &'a Path,
        /// `R_OK | W_OK | X_OK` or `F_OK`.
        mask: i32,
    },
    /// See [`OperationKind::Readlink`]. The target is copied into `buf`,
    /// truncated to `buf.len() - 1` bytes and NUL-terminated.
    Readlink {
        /// Virtual path.
        path: &'a Path,
        /// Host buffer.
        buf: &'a mut [u8],
    },
    /// See [`OperationKind::Readdir`].
    Readdir {
        /// Virtual path.
        path: &'a Path,
        /// Called once per real entry, in real order.
        filler: &'a mut dyn FnMut(&DirEntry) -> FillResult,
    },
    /// See [`OperationKind::Mknod`].
    Mknod {
        /// Virtual path.
        path: &'a Path,
        /// Type and permission bits.
        mode: u32,
        /// Device number.
        rdev: u64,
    },
    /// See [`OperationKind::Mkdir`].
    Mkdir {
        /// Virtual path.
        path: &'a Path,
        /// Permission bits.
        mode: u32,
    },
    /// See [`OperationKind::Unlink`].
    Unlink {
        /// Virtual path.
        path: &'a Path,
    },
    /// See [`OperationKind::Rmdir`].
    Rmdir {
        /// Virtual path.
        path: &'a Path,
    },
    /// See [`OperationKind::Symlink`].
    Symlink {
        /// Link content, stored verbatim.
        target: &'a Path,
        /// Virtual path of the new link.
        link: &'a Path,
    },
    /// See [`OperationKind::Rename`].
    Rename {
        /// Virtual source path.
        from: &'a Path,
        /// Virtual destination path.
        to: &'a Path,
    },
    /// See [`OperationKind::Link`].
    Link {
        /// Virtual path of the existing entry.
        from: &'a Path,
        /// Virtual path of the new link.
        to: &'a Path,
    },
    /// See [`OperationKind::Chmod`].
    Chmod {
        /// Virtual path.
        path: &'a Path,
        /// Permission bits.
        mode: u32,
    },
    /// See [`OperationKind::Chown`].
    Chown {
        /// Virtual path.
        path: &'a Path,
        /// New owner, or `None` to keep.
        uid: Option<u32>,
        /// New group, or `None` to keep.
        gid: Option<u32>,
    },
    /// See [`OperationKind::Truncate`].
    Truncate {
        /// Virtual path.
        path: &'a Path,
        /// New size.
        size: u64,
    },
    /// See [`OperationKind::Utimens`].
    Utimens {
        /// Virtual path.
        path: &'a Path,
        /// Access time.
        accessed: Timestamp,
        /// Modification time.
        modified: Timestamp,
    },
    /// See [`OperationKind::Open`].
    Open {
        /// Virtual path.
        path: &'a Path,
        /// Raw `open(2)` flags.
        flags: i32,
    },
    /// See [`OperationKind::Read`].
    Read {
        /// Virtual path.
        path: &'a Path,
        /// Destination.
        buf: &'a mut [u8],
        /// Byte offset.
        offset: u64,
    },
    /// See [`OperationKind::Write`].
    Write {
        /// Virtual path.
        path: &'a Path,
        /// Source.
        data: &'a [u8],
        /// Byte offset.
        offset: u64,
    },
    /// See [`OperationKind::Statfs`].
    Statfs {
        /// Virtual path.
        path: &'a Path,
    },
    /// See [`OperationKind::Release`].
    Release {
        /// Virtual path.
        path: &'a Path,
    },
    /// See [`OperationKind::Fsync`].
    Fsync {
        /// Virtual path.
        path: &'a Path,
        /// Flush data only.
        datasync: bool,
    },
    /// See [`OperationKind::Fallocate`].
    Fallocate {
        /// Virtual path.
        path: &'a Path,
        /// Allocation mode; only `0` is supported.
        mode: i32,
        /// Byte offset.
        offset: u64,
        /// Byte length.
        len: u64,
    },
    /// See [`OperationKind::Setxattr`].
    Setxattr {
        /// Virtual path.
        path: &'a Path,
        /// Attribute name.
        name: &'a OsStr,
        /// Attribute value.
        value: &'a [u8],
        /// `0`, `XATTR_CREATE` or `XATTR_REPLACE`.
        flags: i32,
    },
    /// See [`OperationKind::Getxattr`].
    Getxattr {
        /// Virtual path.
        path: &'a Path,
        /// Attribute name.
        name: &'a OsStr,
        /// Destination; empty to query the size.
        buf: &'a mut [u8],
    },
    /// See [`OperationKind::Listxattr`].
    Listxattr {
        /// Virtual path.
        path: &'a Path,
        /// Destination; empty to query the size.
        buf: &'a mut [u8],
    },
    /// See [`OperationKind::Removexattr`].
    Removexattr {
        /// Virtual path.
        path: &'a Path,
        /// Attribute name.
        name: &'a OsStr,
    },
}

impl Request<'_> {
    /// The slot this request is routed to.
    pub fn kind(&self) -> OperationKind {
        match self {
            Request::Getattr { .. } => OperationKind::Getattr,
            Request::Access { .. } => OperationKind::Access,
            Request::Readlink { .. } => OperationKind::Readlink,
            Request::Readdir { .. } => OperationKind::Readdir,
            Request::Mknod { .. } => OperationKind::Mknod,
            Request::Mkdir { .. } => OperationKind::Mkdir,
            Request::Unlink { .. } => OperationKind::Unlink,
            Request::Rmdir { .. } => OperationKind::Rmdir,
            Request::Symlink { .. } => OperationKind::Symlink,
            Request::Rename { .. } => OperationKind::Rename,
            Request::Link { .. } => OperationKind::Link,
            Request::Chmod { .. } => OperationKind::Chmod,
            Request::Chown { .. } => OperationKind::Chown,
            Request::Truncate { .. } => OperationKind::Truncate,
            Request::Utimens { .. } => OperationKind::Utimens,
            Request::Open { .. } => OperationKind::Open,
            Request::Read { .. } => OperationKind::Read,
            Request::Write { .. } => OperationKind::Write,
            Request::Statfs { .. } => OperationKind::Statfs,
            Request::Release { .. } => OperationKind::Release,
            Request::Fsync { .. } => OperationKind::Fsync,
            Request::Fallocate { .. } => OperationKind::Fallocate,
            Request::Setxattr { .. } => OperationKind::Setxattr,
            Request::Getxattr { .. } => OperationKind::Getxattr,
            Request::Listxattr { .. } => OperationKind::Listxattr,
            Request::Removexattr { .. } => OperationKind::Removexattr,
        }
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Success payload of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status-only success.
    Empty,
    /// `getattr` result.
    Attr(Metadata),
    /// Bytes read, written, or required (xattr queries).
    Count(usize),
    /// `statfs` result.
    Statfs(StatFs),
}

/// A table slot: runs one operation against a backend.
pub type Handler = fn(&dyn FsFull, Request<'_>) -> Result<Reply, FsError>;

/// Kind → handler mapping, fixed at construction.
#[derive(Clone, Copy)]
pub struct OperationTable {
    slots: [Option<Handler>; OperationKind::COUNT],
    capabilities: Capabilities,
}

impl OperationTable {
    /// Fill every slot `capabilities` allows.
    pub fn new(capabilities: Capabilities) -> Self {
        let mut slots: [Option<Handler>; OperationKind::COUNT] = [None; OperationKind::COUNT];
        for kind in OperationKind::ALL {
            if kind.is_available(capabilities) {
                slots[kind.index()] = Some(handler_for(kind));
            }
        }
        Self {
            slots,
            capabilities,
        }
    }

    /// The handler bound to `kind`, if any.
    #[inline]
    pub fn handler(&self, kind: OperationKind) -> Option<Handler> {
        self.slots[kind.index()]
    }

    /// Whether `kind` has a handler.
    #[inline]
    pub fn supports(&self, kind: OperationKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// The capabilities the table was built with.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::new(Capabilities::detect())
    }
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<_> = OperationKind::ALL
            .into_iter()
            .filter(|kind| self.supports(*kind))
            .map(OperationKind::name)
            .collect();
        f.debug_struct("OperationTable")
            .field("supported", &supported)
            .finish()
    }
}

/// Owns a backend and a table, and routes requests between them.
///
/// # Example
///
/// ```rust,no_run
/// use mirrorfs::{status, Capabilities, Dispatcher, Passthrough, Reply, Request};
/// use std::path::Path;
///
/// let dispatcher = Dispatcher::new(Passthrough::from_root("/srv/data")?, Capabilities::detect());
/// let result = dispatcher.dispatch(Request::Getattr { path: Path::new("/") });
/// assert!(matches!(result, Ok(Reply::Attr(_))));
/// assert_eq!(status(&result), 0);
/// # Ok::<(), mirrorfs::FsError>(())
/// ```
#[derive(Debug)]
pub struct Dispatcher<B> {
    backend: B,
    table: OperationTable,
}

impl<B: FsFull> Dispatcher<B> {
    /// Build a table for `capabilities` and bind it to `backend`.
    pub fn new(backend: B, capabilities: Capabilities) -> Self {
        Self {
            backend,
            table: OperationTable::new(capabilities),
        }
    }

    /// The backend requests are routed to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The routing table.
    pub fn table(&self) -> &OperationTable {
        &self.table
    }

    /// Run `request` through its slot.
    ///
    /// # Errors
    ///
    /// - [`FsError::Unimplemented`] if the slot is empty
    /// - whatever the handler returns
    pub fn dispatch(&self, request: Request<'_>) -> Result<Reply, FsError> {
        let kind = request.kind();
        let Some(handler) = self.table.handler(kind) else {
            tracing::debug!(operation = kind.name(), "no handler registered");
            return Err(FsError::Unimplemented {
                operation: kind.name(),
            });
        };

        let result = handler(&self.backend, request);
        if let Err(err) = &result {
            tracing::debug!(
                operation = kind.name(),
                errno = err.errno(),
                error = %err,
                "operation failed"
            );
        }
        result
    }
}

/// Signed status of a dispatch result: the byte count for [`Reply::Count`],
/// `0` for other successes, `-errno` on failure.
pub fn status(result: &Result<Reply, FsError>) -> i32 {
    match result {
        Ok(Reply::Count(n)) => i32::try_from(*n).unwrap_or(i32::MAX),
        Ok(_) => 0,
        Err(err) => err.status(),
    }
}

fn handler_for(kind: OperationKind) -> Handler {
    match kind {
        OperationKind::Getattr => getattr,
        OperationKind::Access => access,
        OperationKind::Readlink => readlink,
        OperationKind::Readdir => readdir,
        OperationKind::Mknod => mknod,
        OperationKind::Mkdir => mkdir,
        OperationKind::Unlink => unlink,
        OperationKind::Rmdir => rmdir,
        OperationKind::Symlink => symlink,
        OperationKind::Rename => rename,
        OperationKind::Link => link,
        OperationKind::Chmod => chmod,
        OperationKind::Chown => chown,
        OperationKind::Truncate => truncate,
        OperationKind::Utimens => utimens,
        OperationKind::Open => open,
        OperationKind::Read => read,
        OperationKind::Write => write,
        OperationKind::Statfs => statfs,
        OperationKind::Release => release,
        OperationKind::Fsync => fsync,
        OperationKind::Fallocate => fallocate,
        OperationKind::Setxattr => setxattr,
        OperationKind::Getxattr => getxattr,
        OperationKind::Listxattr => listxattr,
        OperationKind::Removexattr => removexattr,
    }
}

/// A request reached a slot of another kind.
fn misrouted(slot: OperationKind) -> FsError {
    FsError::Unimplemented {
        operation: slot.name(),
    }
}

fn getattr(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Getattr { path } = request else {
        return Err(misrouted(OperationKind::Getattr));
    };
    fs.metadata(path).map(Reply::Attr)
}

fn access(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Access { path, mask } = request else {
        return Err(misrouted(OperationKind::Access));
    };
    fs.access(path, mask).map(|()| Reply::Empty)
}

fn readlink(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Readlink { path, buf } = request else {
        return Err(misrouted(OperationKind::Readlink));
    };
    let Some(capacity) = buf.len().checked_sub(1) else {
        return Err(FsError::os(
            "readlink",
            path,
            io::Error::from_raw_os_error(libc::EINVAL),
        ));
    };
    let target = fs.read_link(path)?;
    let bytes = std::os::unix::ffi::OsStrExt::as_bytes(target.as_os_str());
    let n = bytes.len().min(capacity);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf[n] = 0;
    Ok(Reply::Empty)
}

fn readdir(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Readdir { path, filler } = request else {
        return Err(misrouted(OperationKind::Readdir));
    };
    for entry in fs.read_dir(path)? {
        if filler(&entry?) == FillResult::Full {
            break;
        }
    }
    Ok(Reply::Empty)
}

fn mknod(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Mknod { path, mode, rdev } = request else {
        return Err(misrouted(OperationKind::Mknod));
    };
    fs.mknod(path, mode, rdev).map(|()| Reply::Empty)
}

fn mkdir(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Mkdir { path, mode } = request else {
        return Err(misrouted(OperationKind::Mkdir));
    };
    fs.create_dir(path, mode).map(|()| Reply::Empty)
}

fn unlink(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Unlink { path } = request else {
        return Err(misrouted(OperationKind::Unlink));
    };
    fs.remove_file(path).map(|()| Reply::Empty)
}

fn rmdir(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Rmdir { path } = request else {
        return Err(misrouted(OperationKind::Rmdir));
    };
    fs.remove_dir(path).map(|()| Reply::Empty)
}

fn symlink(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Symlink { target, link } = request else {
        return Err(misrouted(OperationKind::Symlink));
    };
    fs.symlink(target, link).map(|()| Reply::Empty)
}

fn rename(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Rename { from, to } = request else {
        return Err(misrouted(OperationKind::Rename));
    };
    fs.rename(from, to).map(|()| Reply::Empty)
}

fn link(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Link { from, to } = request else {
        return Err(misrouted(OperationKind::Link));
    };
    fs.hard_link(from, to).map(|()| Reply::Empty)
}

fn chmod(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Chmod { path, mode } = request else {
        return Err(misrouted(OperationKind::Chmod));
    };
    fs.set_permissions(path, Permissions::from_mode(mode))
        .map(|()| Reply::Empty)
}

fn chown(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Chown { path, uid, gid } = request else {
        return Err(misrouted(OperationKind::Chown));
    };
    fs.set_owner(path, uid, gid).map(|()| Reply::Empty)
}

fn truncate(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Truncate { path, size } = request else {
        return Err(misrouted(OperationKind::Truncate));
    };
    fs.truncate(path, size).map(|()| Reply::Empty)
}

fn utimens(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Utimens {
        path,
        accessed,
        modified,
    } = request
    else {
        return Err(misrouted(OperationKind::Utimens));
    };
    fs.set_times(path, accessed, modified).map(|()| Reply::Empty)
}

fn open(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Open { path, flags } = request else {
        return Err(misrouted(OperationKind::Open));
    };
    fs.open(path, flags).map(|()| Reply::Empty)
}

fn read(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Read { path, buf, offset } = request else {
        return Err(misrouted(OperationKind::Read));
    };
    fs.read(path, buf, offset).map(Reply::Count)
}

fn write(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Write { path, data, offset } = request else {
        return Err(misrouted(OperationKind::Write));
    };
    fs.write(path, data, offset).map(Reply::Count)
}

fn statfs(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Statfs { path } = request else {
        return Err(misrouted(OperationKind::Statfs));
    };
    fs.statfs(path).map(Reply::Statfs)
}

fn release(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Release { path } = request else {
        return Err(misrouted(OperationKind::Release));
    };
    fs.release(path).map(|()| Reply::Empty)
}

fn fsync(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Fsync { path, datasync } = request else {
        return Err(misrouted(OperationKind::Fsync));
    };
    fs.fsync(path, datasync).map(|()| Reply::Empty)
}

fn fallocate(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Fallocate {
        path,
        mode,
        offset,
        len,
    } = request
    else {
        return Err(misrouted(OperationKind::Fallocate));
    };
    fs.allocate(path, mode, offset, len).map(|()| Reply::Empty)
}

fn setxattr(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Setxattr {
        path,
        name,
        value,
        flags,
    } = request
    else {
        return Err(misrouted(OperationKind::Setxattr));
    };
    fs.set_xattr(path, name, value, flags).map(|()| Reply::Empty)
}

fn getxattr(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Getxattr { path, name, buf } = request else {
        return Err(misrouted(OperationKind::Getxattr));
    };
    fs.get_xattr(path, name, buf).map(Reply::Count)
}

fn listxattr(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Listxattr { path, buf } = request else {
        return Err(misrouted(OperationKind::Listxattr));
    };
    fs.list_xattr(path, buf).map(Reply::Count)
}

fn removexattr(fs: &dyn FsFull, request: Request<'_>) -> Result<Reply, FsError> {
    let Request::Removexattr { path, name } = request else {
        return Err(misrouted(OperationKind::Removexattr));
    };
    fs.remove_xattr(path, name).map(|()| Reply::Empty)
}
