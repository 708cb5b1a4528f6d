//! Kernel adapter: serves a [`Dispatcher`] through `fuser`.
//!
//! The kernel speaks in inode numbers; the operation table speaks in virtual
//! paths. [`InodeTable`] bridges the two. Every kernel request is resolved to
//! a path, turned into a [`Request`], dispatched, and the [`Reply`] is
//! translated back into the kernel's reply type. Errors go back as the
//! positive errno `fuser` expects.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, Filesystem, KernelConfig, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, TimeOrNow,
};

use crate::path_resolver::MAX_PATH_LEN;
use crate::{
    Capabilities, DirEntry, Dispatcher, FileType, FillResult, FsError, FsFull, Metadata,
    MountConfig, MountContext, Passthrough, ROOT_INODE, Reply, Request, Timestamp,
};

/// How long the kernel may cache attributes and entries.
pub const TTL: Duration = Duration::from_secs(1);

/// Bidirectional inode ↔ virtual path map.
///
/// Inodes are handed out on first sight of a path and never reused. The root
/// is always [`ROOT_INODE`] and is never dropped.
#[derive(Debug)]
pub struct InodeTable {
    paths: HashMap<u64, PathBuf>,
    inodes: HashMap<PathBuf, u64>,
    lookups: HashMap<u64, u64>,
    next: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// A table holding only the root.
    pub fn new() -> Self {
        let root = PathBuf::from("/");
        Self {
            paths: HashMap::from([(ROOT_INODE, root.clone())]),
            inodes: HashMap::from([(root, ROOT_INODE)]),
            lookups: HashMap::new(),
            next: ROOT_INODE + 1,
        }
    }

    /// Virtual path bound to `ino`.
    pub fn path(&self, ino: u64) -> Option<&Path> {
        self.paths.get(&ino).map(PathBuf::as_path)
    }

    /// Virtual path of `name` inside directory `parent`.
    pub fn child(&self, parent: u64, name: &OsStr) -> Option<PathBuf> {
        self.path(parent).map(|dir| dir.join(name))
    }

    /// Inode already bound to `path`, if any.
    pub fn get(&self, path: &Path) -> Option<u64> {
        self.inodes.get(path).copied()
    }

    /// Inode of `path`, allocating one if the path is new.
    pub fn inode(&mut self, path: &Path) -> u64 {
        if let Some(&ino) = self.inodes.get(path) {
            return ino;
        }
        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.to_path_buf());
        self.inodes.insert(path.to_path_buf(), ino);
        ino
    }

    /// Like [`inode`](Self::inode), and count one kernel reference.
    pub fn lookup(&mut self, path: &Path) -> u64 {
        let ino = self.inode(path);
        *self.lookups.entry(ino).or_insert(0) += 1;
        ino
    }

    /// Drop `nlookup` kernel references; unbind the inode when none remain.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if ino == ROOT_INODE {
            return;
        }
        let remaining = match self.lookups.get_mut(&ino) {
            Some(count) => {
                *count = count.saturating_sub(nlookup);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.lookups.remove(&ino);
            if let Some(path) = self.paths.remove(&ino) {
                self.inodes.remove(&path);
            }
        }
    }

    /// Unbind `path` after it was removed from the tree.
    pub fn remove(&mut self, path: &Path) {
        if let Some(ino) = self.inodes.remove(path) {
            self.paths.remove(&ino);
            self.lookups.remove(&ino);
        }
    }

    /// Rebind `from` and everything below it to `to`. Whatever was bound at
    /// `to` is replaced.
    pub fn rename(&mut self, from: &Path, to: &Path) {
        let replaced: Vec<PathBuf> = self
            .inodes
            .keys()
            .filter(|p| p.starts_with(to))
            .cloned()
            .collect();
        for path in replaced {
            self.remove(&path);
        }

        let moved: Vec<(PathBuf, u64)> = self
            .inodes
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, ino)| (p.clone(), *ino))
            .collect();
        for (old, ino) in moved {
            let Ok(rest) = old.strip_prefix(from) else {
                continue;
            };
            let new = if rest.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(rest)
            };
            self.inodes.remove(&old);
            self.inodes.insert(new.clone(), ino);
            self.paths.insert(ino, new);
        }
    }

    /// Number of bound inodes, root included.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always `false`: the root is always bound.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// `fuser` front end over a [`Dispatcher`].
#[derive(Debug)]
pub struct MirrorFs<B> {
    dispatcher: Dispatcher<B>,
    inodes: InodeTable,
}

impl<B: FsFull> MirrorFs<B> {
    /// Serve `dispatcher`.
    pub fn new(dispatcher: Dispatcher<B>) -> Self {
        Self {
            dispatcher,
            inodes: InodeTable::new(),
        }
    }

    /// The inode bookkeeping.
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    fn metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        match self.dispatcher.dispatch(Request::Getattr { path })? {
            Reply::Attr(meta) => Ok(meta),
            _ => Err(FsError::Unimplemented {
                operation: "getattr",
            }),
        }
    }

    fn attr(&self, ino: u64, path: &Path) -> Result<FileAttr, FsError> {
        self.metadata(path).map(|meta| file_attr(ino, &meta))
    }

    /// Answer a lookup or creation with the entry's attributes. Only paths
    /// that exist get an inode.
    fn reply_entry(&mut self, path: &Path, reply: ReplyEntry) {
        match self.metadata(path) {
            Ok(meta) => {
                let ino = self.inodes.lookup(path);
                reply.entry(&TTL, &file_attr(ino, &meta), 0);
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn path_of(&self, ino: u64) -> Result<PathBuf, i32> {
        self.inodes
            .path(ino)
            .map(Path::to_path_buf)
            .ok_or(libc::ENOENT)
    }

    fn child_of(&self, parent: u64, name: &OsStr) -> Result<PathBuf, i32> {
        self.inodes.child(parent, name).ok_or(libc::ENOENT)
    }

    fn empty(&self, request: Request<'_>, reply: ReplyEmpty) {
        match self.dispatcher.dispatch(request) {
            Ok(_) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    /// Feed the listing of directory `ino` (bound to `path`) to `sink`,
    /// resuming after cookie `offset`.
    ///
    /// Entries nobody looked up are reported under their real inode number;
    /// listing never binds new inodes.
    pub fn list_dir<S>(
        &self,
        ino: u64,
        path: &Path,
        offset: i64,
        sink: &mut S,
    ) -> Result<(), FsError>
    where
        S: FnMut(u64, i64, fuser::FileType, &OsStr) -> bool,
    {
        let parent_ino = path
            .parent()
            .and_then(|parent| self.inodes.get(parent))
            .unwrap_or(ino);

        let mut cursor = DirCursor::new(offset);
        if cursor.push(ino, fuser::FileType::Directory, OsStr::new("."), &mut *sink)
            || cursor.push(parent_ino, fuser::FileType::Directory, OsStr::new(".."), &mut *sink)
        {
            return Ok(());
        }

        let mut filler = |entry: &DirEntry| {
            let child = self
                .inodes
                .get(&path.join(&entry.name))
                .unwrap_or(entry.inode);
            if cursor.push(child, kernel_type(entry.file_type), &entry.name, &mut *sink) {
                FillResult::Full
            } else {
                FillResult::Continue
            }
        };
        self.dispatcher
            .dispatch(Request::Readdir {
                path,
                filler: &mut filler,
            })
            .map(drop)
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr_inner(
        &self,
        path: &Path,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
    ) -> Result<(), FsError> {
        if let Some(mode) = mode {
            self.dispatcher.dispatch(Request::Chmod { path, mode })?;
        }
        if uid.is_some() || gid.is_some() {
            self.dispatcher.dispatch(Request::Chown { path, uid, gid })?;
        }
        if let Some(size) = size {
            self.dispatcher.dispatch(Request::Truncate { path, size })?;
        }
        if atime.is_some() || mtime.is_some() {
            self.dispatcher.dispatch(Request::Utimens {
                path,
                accessed: timestamp(atime),
                modified: timestamp(mtime),
            })?;
        }
        Ok(())
    }
}

/// Position in a directory listing that the kernel reads in batches.
///
/// Every entry, `.` and `..` included, gets the 1-based cookie of its
/// position. The kernel passes back the cookie of the last entry it kept, so
/// a listing resumed at `offset` skips the first `offset` entries.
#[derive(Debug, Clone, Copy)]
pub struct DirCursor {
    offset: i64,
    position: i64,
}

impl DirCursor {
    /// Resume after cookie `offset`.
    pub fn new(offset: i64) -> Self {
        Self {
            offset,
            position: 0,
        }
    }

    /// Offer the next entry. Skipped entries never reach `sink`. Returns
    /// `true` once `sink` reports its buffer full; that entry was not kept.
    pub fn push<S>(&mut self, ino: u64, kind: fuser::FileType, name: &OsStr, sink: &mut S) -> bool
    where
        S: FnMut(u64, i64, fuser::FileType, &OsStr) -> bool,
    {
        self.position += 1;
        self.position > self.offset && sink(ino, self.position, kind, name)
    }
}

/// Kernel attribute record for `meta`, reported under inode `ino`.
pub fn file_attr(ino: u64, meta: &Metadata) -> FileAttr {
    FileAttr {
        ino,
        size: meta.size,
        blocks: meta.blocks,
        atime: meta.accessed,
        mtime: meta.modified,
        ctime: meta.changed,
        crtime: meta.changed,
        kind: kernel_type(Some(meta.file_type)),
        perm: meta.permissions.mode() as u16,
        nlink: u32::try_from(meta.nlink).unwrap_or(u32::MAX),
        uid: meta.uid,
        gid: meta.gid,
        rdev: meta.rdev as u32,
        blksize: meta.block_size,
        flags: 0,
    }
}

/// Unknown entry types are reported as regular files.
pub fn kernel_type(file_type: Option<FileType>) -> fuser::FileType {
    match file_type {
        Some(FileType::Directory) => fuser::FileType::Directory,
        Some(FileType::Symlink) => fuser::FileType::Symlink,
        Some(FileType::Fifo) => fuser::FileType::NamedPipe,
        Some(FileType::Socket) => fuser::FileType::Socket,
        Some(FileType::CharDevice) => fuser::FileType::CharDevice,
        Some(FileType::BlockDevice) => fuser::FileType::BlockDevice,
        Some(FileType::File) | None => fuser::FileType::RegularFile,
    }
}

/// `None` leaves the timestamp alone.
pub fn timestamp(time: Option<TimeOrNow>) -> Timestamp {
    match time {
        None => Timestamp::Omit,
        Some(TimeOrNow::Now) => Timestamp::Now,
        Some(TimeOrNow::SpecificTime(t)) => Timestamp::At(t),
    }
}

fn offset(value: i64) -> Result<u64, i32> {
    u64::try_from(value).map_err(|_| libc::EINVAL)
}

impl<B: FsFull> Filesystem for MirrorFs<B> {
    fn init(
        &mut self,
        _req: &fuser::Request<'_>,
        _config: &mut KernelConfig,
    ) -> Result<(), libc::c_int> {
        tracing::info!(table = ?self.dispatcher.table(), "session started");
        Ok(())
    }

    fn destroy(&mut self) {
        tracing::info!(inodes = self.inodes.len(), "session ended");
    }

    fn lookup(&mut self, _req: &fuser::Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.child_of(parent, name) {
            Ok(path) => self.reply_entry(&path, reply),
            Err(errno) => reply.error(errno),
        }
    }

    fn forget(&mut self, _req: &fuser::Request<'_>, ino: u64, nlookup: u64) {
        self.inodes.forget(ino, nlookup);
    }

    fn getattr(&mut self, _req: &fuser::Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.attr(ino, &path) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn setattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        let result = self
            .setattr_inner(&path, mode, uid, gid, size, atime, mtime)
            .and_then(|()| self.attr(ino, &path));
        match result {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readlink(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: ReplyData) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        let mut buf = vec![0u8; MAX_PATH_LEN];
        match self.dispatcher.dispatch(Request::Readlink {
            path: &path,
            buf: &mut buf,
        }) {
            Ok(_) => {
                let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
                reply.data(&buf[..len]);
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn mknod(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        rdev: u32,
        reply: ReplyEntry,
    ) {
        let path = match self.child_of(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Mknod {
            path: &path,
            mode,
            rdev: u64::from(rdev),
        }) {
            Ok(_) => self.reply_entry(&path, reply),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let path = match self.child_of(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Mkdir { path: &path, mode }) {
            Ok(_) => self.reply_entry(&path, reply),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn unlink(&mut self, _req: &fuser::Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = match self.child_of(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Unlink { path: &path }) {
            Ok(_) => {
                self.inodes.remove(&path);
                reply.ok();
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn rmdir(&mut self, _req: &fuser::Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = match self.child_of(parent, name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Rmdir { path: &path }) {
            Ok(_) => {
                self.inodes.remove(&path);
                reply.ok();
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn symlink(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        let link = match self.child_of(parent, link_name) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Symlink {
            target,
            link: &link,
        }) {
            Ok(_) => self.reply_entry(&link, reply),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn rename(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        flags: u32,
        reply: ReplyEmpty,
    ) {
        // RENAME_NOREPLACE / RENAME_EXCHANGE have no plain rename(2) equivalent.
        if flags != 0 {
            return reply.error(libc::EINVAL);
        }
        let (from, to) = match (self.child_of(parent, name), self.child_of(newparent, newname)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(errno), _) | (_, Err(errno)) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Rename {
            from: &from,
            to: &to,
        }) {
            Ok(_) => {
                self.inodes.rename(&from, &to);
                reply.ok();
            }
            Err(e) => reply.error(e.errno()),
        }
    }

    fn link(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        let (from, to) = match (self.path_of(ino), self.child_of(newparent, newname)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(errno), _) | (_, Err(errno)) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Link {
            from: &from,
            to: &to,
        }) {
            Ok(_) => self.reply_entry(&to, reply),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn open(&mut self, _req: &fuser::Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Open { path: &path, flags }) {
            // Stateless: every read and write reopens by path.
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let (path, offset) = match (self.path_of(ino), self::offset(offset)) {
            (Ok(path), Ok(offset)) => (path, offset),
            (Err(errno), _) | (_, Err(errno)) => return reply.error(errno),
        };
        let mut buf = vec![0u8; size as usize];
        match self.dispatcher.dispatch(Request::Read {
            path: &path,
            buf: &mut buf,
            offset,
        }) {
            Ok(Reply::Count(n)) => reply.data(&buf[..n]),
            Ok(_) => reply.error(libc::EIO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn write(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let (path, offset) = match (self.path_of(ino), self::offset(offset)) {
            (Ok(path), Ok(offset)) => (path, offset),
            (Err(errno), _) | (_, Err(errno)) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Write {
            path: &path,
            data,
            offset,
        }) {
            Ok(Reply::Count(n)) => reply.written(u32::try_from(n).unwrap_or(u32::MAX)),
            Ok(_) => reply.error(libc::EIO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn release(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        match self.path_of(ino) {
            Ok(path) => self.empty(Request::Release { path: &path }, reply),
            Err(errno) => reply.error(errno),
        }
    }

    fn fsync(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        datasync: bool,
        reply: ReplyEmpty,
    ) {
        match self.path_of(ino) {
            Ok(path) => self.empty(Request::Fsync { path: &path, datasync }, reply),
            Err(errno) => reply.error(errno),
        }
    }

    fn readdir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        let result = self.list_dir(ino, &path, offset, &mut |ino, cookie, kind, name: &OsStr| {
            reply.add(ino, cookie, kind, name)
        });
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn statfs(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: ReplyStatfs) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        match self.dispatcher.dispatch(Request::Statfs { path: &path }) {
            Ok(Reply::Statfs(st)) => reply.statfs(
                st.blocks,
                st.blocks_free,
                st.blocks_available,
                st.files,
                st.files_free,
                u32::try_from(st.block_size).unwrap_or(u32::MAX),
                u32::try_from(st.max_name_len).unwrap_or(u32::MAX),
                u32::try_from(st.fragment_size).unwrap_or(u32::MAX),
            ),
            Ok(_) => reply.error(libc::EIO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn setxattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        name: &OsStr,
        value: &[u8],
        flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        match self.path_of(ino) {
            Ok(path) => self.empty(
                Request::Setxattr {
                    path: &path,
                    name,
                    value,
                    flags,
                },
                reply,
            ),
            Err(errno) => reply.error(errno),
        }
    }

    fn getxattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        name: &OsStr,
        size: u32,
        reply: ReplyXattr,
    ) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        let mut buf = vec![0u8; size as usize];
        let result = self.dispatcher.dispatch(Request::Getxattr {
            path: &path,
            name,
            buf: &mut buf,
        });
        reply_xattr(result, size, &buf, reply);
    }

    fn listxattr(&mut self, _req: &fuser::Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => return reply.error(errno),
        };
        let mut buf = vec![0u8; size as usize];
        let result = self.dispatcher.dispatch(Request::Listxattr {
            path: &path,
            buf: &mut buf,
        });
        reply_xattr(result, size, &buf, reply);
    }

    fn removexattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        name: &OsStr,
        reply: ReplyEmpty,
    ) {
        match self.path_of(ino) {
            Ok(path) => self.empty(Request::Removexattr { path: &path, name }, reply),
            Err(errno) => reply.error(errno),
        }
    }

    fn access(&mut self, _req: &fuser::Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        match self.path_of(ino) {
            Ok(path) => self.empty(Request::Access { path: &path, mask }, reply),
            Err(errno) => reply.error(errno),
        }
    }

    fn fallocate(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        length: i64,
        mode: i32,
        reply: ReplyEmpty,
    ) {
        let checked = (self.path_of(ino), self::offset(offset), self::offset(length));
        let (path, offset, len) = match checked {
            (Ok(path), Ok(offset), Ok(len)) => (path, offset, len),
            (Err(errno), _, _) | (_, Err(errno), _) | (_, _, Err(errno)) => {
                return reply.error(errno);
            }
        };
        self.empty(
            Request::Fallocate {
                path: &path,
                mode,
                offset,
                len,
            },
            reply,
        );
    }
}

/// Size query (`size == 0`) gets the required length; otherwise the data.
fn reply_xattr(result: Result<Reply, FsError>, size: u32, buf: &[u8], reply: ReplyXattr) {
    match result {
        Ok(Reply::Count(n)) if size == 0 => reply.size(u32::try_from(n).unwrap_or(u32::MAX)),
        Ok(Reply::Count(n)) => reply.data(&buf[..n]),
        Ok(_) => reply.error(libc::EIO),
        Err(e) => reply.error(e.errno()),
    }
}

/// Mount the mirror described by `config` and serve it until unmounted.
///
/// # Errors
///
/// - [`FsError::RootUnavailable`] / [`FsError::NotADirectory`] if the root
///   cannot be activated
/// - [`FsError::Mount`] if the host runtime fails
pub fn mount(config: &MountConfig) -> Result<(), FsError> {
    let context = Arc::new(MountContext::new(&config.root)?);
    let options = config.mount_options(context.root());
    let capabilities = Capabilities::detect();
    tracing::info!(
        root = %context.root().display(),
        mountpoint = %config.mountpoint.display(),
        ?capabilities,
        "mounting"
    );

    let fs = MirrorFs::new(Dispatcher::new(Passthrough::new(context), capabilities));
    fuser::mount2(fs, &config.mountpoint, &options).map_err(|source| FsError::Mount {
        mountpoint: config.mountpoint.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permissions;
    use std::time::UNIX_EPOCH;

    #[test]
    fn root_is_preallocated() {
        let table = InodeTable::new();
        assert_eq!(table.path(ROOT_INODE), Some(Path::new("/")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn child_paths_join_under_parent() {
        let mut table = InodeTable::new();
        assert_eq!(
            table.child(ROOT_INODE, OsStr::new("a")),
            Some(PathBuf::from("/a"))
        );
        let dir = table.inode(Path::new("/a"));
        assert_eq!(
            table.child(dir, OsStr::new("b")),
            Some(PathBuf::from("/a/b"))
        );
        assert_eq!(table.child(999, OsStr::new("x")), None);
    }

    #[test]
    fn inodes_are_stable_and_unique() {
        let mut table = InodeTable::new();
        let a = table.inode(Path::new("/a"));
        let b = table.inode(Path::new("/b"));
        assert_ne!(a, b);
        assert_ne!(a, ROOT_INODE);
        assert_eq!(table.inode(Path::new("/a")), a);
    }

    #[test]
    fn forget_drops_after_last_reference() {
        let mut table = InodeTable::new();
        let ino = table.lookup(Path::new("/f"));
        table.lookup(Path::new("/f"));
        table.forget(ino, 1);
        assert!(table.path(ino).is_some());
        table.forget(ino, 1);
        assert!(table.path(ino).is_none());
    }

    #[test]
    fn forget_never_drops_root() {
        let mut table = InodeTable::new();
        table.forget(ROOT_INODE, 100);
        assert_eq!(table.path(ROOT_INODE), Some(Path::new("/")));
    }

    #[test]
    fn rename_moves_descendants() {
        let mut table = InodeTable::new();
        let dir = table.inode(Path::new("/d"));
        let file = table.inode(Path::new("/d/f"));
        let other = table.inode(Path::new("/dx"));

        table.rename(Path::new("/d"), Path::new("/e"));

        assert_eq!(table.path(dir), Some(Path::new("/e")));
        assert_eq!(table.path(file), Some(Path::new("/e/f")));
        // `/dx` is not below `/d`
        assert_eq!(table.path(other), Some(Path::new("/dx")));
    }

    #[test]
    fn rename_replaces_target() {
        let mut table = InodeTable::new();
        let src = table.inode(Path::new("/a"));
        let dst = table.inode(Path::new("/b"));
        table.rename(Path::new("/a"), Path::new("/b"));
        assert_eq!(table.path(src), Some(Path::new("/b")));
        assert!(table.path(dst).is_none());
        assert_eq!(table.inode(Path::new("/b")), src);
    }

    #[test]
    fn remove_unbinds() {
        let mut table = InodeTable::new();
        let ino = table.lookup(Path::new("/gone"));
        table.remove(Path::new("/gone"));
        assert!(table.path(ino).is_none());
        assert_ne!(table.inode(Path::new("/gone")), ino);
    }

    #[test]
    fn timestamps_map_from_kernel_form() {
        assert_eq!(timestamp(None), Timestamp::Omit);
        assert_eq!(timestamp(Some(TimeOrNow::Now)), Timestamp::Now);
        assert_eq!(
            timestamp(Some(TimeOrNow::SpecificTime(UNIX_EPOCH))),
            Timestamp::At(UNIX_EPOCH)
        );
    }

    #[test]
    fn file_attr_carries_metadata() {
        let meta = Metadata {
            file_type: FileType::Symlink,
            permissions: Permissions::from_mode(0o4755),
            inode: 77,
            nlink: 3,
            uid: 1000,
            gid: 100,
            rdev: 0,
            size: 12,
            blocks: 8,
            block_size: 4096,
            accessed: UNIX_EPOCH,
            modified: UNIX_EPOCH + Duration::from_secs(5),
            changed: UNIX_EPOCH + Duration::from_secs(9),
        };
        let attr = file_attr(42, &meta);
        assert_eq!(attr.ino, 42);
        assert_eq!(attr.kind, fuser::FileType::Symlink);
        assert_eq!(attr.perm, 0o4755);
        assert_eq!(attr.nlink, 3);
        assert_eq!(attr.size, 12);
        assert_eq!(attr.mtime, UNIX_EPOCH + Duration::from_secs(5));
    }

    #[test]
    fn unknown_entry_type_is_regular() {
        assert_eq!(kernel_type(None), fuser::FileType::RegularFile);
        assert_eq!(kernel_type(Some(FileType::Fifo)), fuser::FileType::NamedPipe);
    }

    #[test]
    fn negative_offsets_are_einval() {
        assert_eq!(offset(-1), Err(libc::EINVAL));
        assert_eq!(offset(10), Ok(10));
    }

    /// One kernel batch over `.`, `..` and `names`: up to `capacity` entries
    /// kept, resuming after `offset`. Returns `(name, cookie)` pairs.
    fn batch(names: &[&str], offset: i64, capacity: usize) -> Vec<(String, i64)> {
        let mut kept = Vec::new();
        let mut sink = |_ino: u64, cookie: i64, _kind: fuser::FileType, name: &OsStr| {
            if kept.len() == capacity {
                return true;
            }
            kept.push((name.to_string_lossy().into_owned(), cookie));
            false
        };
        let mut cursor = DirCursor::new(offset);
        let dir = fuser::FileType::Directory;
        let file = fuser::FileType::RegularFile;
        let _ = cursor.push(1, dir, OsStr::new("."), &mut sink)
            || cursor.push(1, dir, OsStr::new(".."), &mut sink)
            || names
                .iter()
                .enumerate()
                .any(|(i, n)| cursor.push(10 + i as u64, file, OsStr::new(n), &mut sink));
        kept
    }

    fn names_of(kept: &[(String, i64)]) -> Vec<&str> {
        kept.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn cursor_assigns_consecutive_cookies() {
        let kept = batch(&["a", "b"], 0, 10);
        assert_eq!(
            kept,
            vec![
                (".".to_owned(), 1),
                ("..".to_owned(), 2),
                ("a".to_owned(), 3),
                ("b".to_owned(), 4),
            ]
        );
    }

    #[test]
    fn cursor_resumes_after_offset() {
        let names = ["a", "b", "c"];
        assert_eq!(names_of(&batch(&names, 0, 10)), [".", "..", "a", "b", "c"]);
        assert_eq!(names_of(&batch(&names, 1, 10)), ["..", "a", "b", "c"]);
        assert_eq!(names_of(&batch(&names, 2, 10)), ["a", "b", "c"]);
        assert_eq!(names_of(&batch(&names, 4, 10)), ["c"]);
        assert!(batch(&names, 5, 10).is_empty());
    }

    #[test]
    fn dots_only_in_first_batch() {
        let names = ["a", "b", "c", "d"];
        let first = batch(&names, 0, 3);
        assert_eq!(names_of(&first), [".", "..", "a"]);
        let next = batch(&names, first[2].1, 3);
        assert_eq!(names_of(&next), ["b", "c", "d"]);
    }

    #[test]
    fn full_buffer_resumes_at_refused_entry() {
        let names: Vec<String> = (0..7).map(|i| format!("f{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let kept = batch(&names, offset, 2);
            let Some(&(_, last)) = kept.last() else {
                break;
            };
            seen.extend(kept.into_iter().map(|(n, _)| n));
            offset = last;
        }

        let mut expected = vec![".".to_owned(), "..".to_owned()];
        expected.extend(names.iter().map(|n| n.to_string()));
        assert_eq!(seen, expected);
    }

    fn mounted() -> (tempfile::TempDir, MirrorFs<Passthrough>) {
        let dir = tempfile::tempdir().unwrap();
        let backend = Passthrough::from_root(dir.path()).unwrap();
        let fs = MirrorFs::new(Dispatcher::new(backend, Capabilities::detect()));
        (dir, fs)
    }

    #[test]
    fn listing_binds_no_inodes() {
        use std::os::unix::fs::MetadataExt;

        let (dir, fs) = mounted();
        for i in 0..50 {
            std::fs::write(dir.path().join(format!("f{i}")), b"").unwrap();
        }

        let mut listed = Vec::new();
        fs.list_dir(ROOT_INODE, Path::new("/"), 0, &mut |ino, _, _, name: &OsStr| {
            listed.push((name.to_owned(), ino));
            false
        })
        .unwrap();

        assert_eq!(listed.len(), 52);
        assert_eq!(fs.inodes().len(), 1);
        let (name, ino) = &listed[2];
        let real = std::fs::metadata(dir.path().join(name)).unwrap().ino();
        assert_eq!(*ino, real);
    }

    #[test]
    fn listing_reports_bound_inodes() {
        let (dir, mut fs) = mounted();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/f"), b"").unwrap();
        let sub = fs.inodes.lookup(Path::new("/sub"));
        let f = fs.inodes.lookup(Path::new("/sub/f"));

        let mut listed = Vec::new();
        fs.list_dir(sub, Path::new("/sub"), 0, &mut |ino, _, _, name: &OsStr| {
            listed.push((name.to_string_lossy().into_owned(), ino));
            false
        })
        .unwrap();

        assert_eq!(
            listed,
            vec![
                (".".to_owned(), sub),
                ("..".to_owned(), ROOT_INODE),
                ("f".to_owned(), f),
            ]
        );
    }

    #[test]
    fn listing_stops_when_sink_is_full() {
        let (dir, fs) = mounted();
        for i in 0..5 {
            std::fs::write(dir.path().join(format!("f{i}")), b"").unwrap();
        }

        let mut first = Vec::new();
        fs.list_dir(ROOT_INODE, Path::new("/"), 0, &mut |_, cookie, _, name: &OsStr| {
            if first.len() == 4 {
                return true;
            }
            first.push((name.to_owned(), cookie));
            false
        })
        .unwrap();
        assert_eq!(first.len(), 4);

        let mut rest = Vec::new();
        fs.list_dir(ROOT_INODE, Path::new("/"), first[3].1, &mut |_, _, _, name: &OsStr| {
            rest.push(name.to_owned());
            false
        })
        .unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest.iter().all(|n| !first.iter().any(|(m, _)| m == n)));
    }
}
