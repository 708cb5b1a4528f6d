//! # Filesystem Traits
//!
//! The capability traits a mirror backend implements, one per group of
//! filesystem operations.
//!
//! ## Trait Layers
//!
//! ```text
//! Mandatory: FsRead + FsWrite + FsDir + FsLink + FsPermissions
//!            + FsStats + FsOpen + FsSync                        = Fs
//!                                                               ↓
//! Optional:  Fs + FsAllocate + FsXattr                          = FsFull
//! ```
//!
//! ## Quick Reference
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsRead`] | `getattr`, `access`, `readlink`, `read` |
//! | [`FsWrite`] | `write`, `truncate`, `mknod`, `unlink` |
//! | [`FsDir`] | `readdir`, `mkdir`, `rmdir` |
//! | [`FsLink`] | `symlink`, `link`, `rename` |
//! | [`FsPermissions`] | `chmod`, `chown`, `utimens` |
//! | [`FsStats`] | `statfs` |
//! | [`FsOpen`] | `open`, `release` |
//! | [`FsSync`] | `fsync` |
//! | [`FsAllocate`] | `fallocate` |
//! | [`FsXattr`] | `setxattr`, `getxattr`, `listxattr`, `removexattr` |
//!
//! Whether the optional operations are actually routed is decided by
//! [`Capabilities`](crate::Capabilities), not by the type system: a backend
//! always implements them, and returns [`FsError::NotSupported`](crate::FsError::NotSupported)
//! on platforms that lack them.
//!
//! ## Blanket Implementations
//!
//! Composite traits have blanket implementations. Implement the component
//! traits and the composite comes for free.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self`.

mod fs_allocate;
mod fs_dir;
mod fs_link;
mod fs_open;
mod fs_permissions;
mod fs_read;
mod fs_stats;
mod fs_sync;
mod fs_write;
mod fs_xattr;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_link::FsLink;
pub use fs_open::FsOpen;
pub use fs_permissions::FsPermissions;
pub use fs_read::FsRead;
pub use fs_stats::FsStats;
pub use fs_sync::FsSync;
pub use fs_write::FsWrite;

pub use fs_allocate::FsAllocate;
pub use fs_xattr::FsXattr;

/// Every mandatory mirror operation.
///
/// # Example
///
/// ```rust
/// use mirrorfs::{Fs, FsError};
/// use std::path::Path;
///
/// fn size_of<B: Fs>(fs: &B, path: &Path) -> Result<u64, FsError> {
///     Ok(fs.metadata(path)?.size)
/// }
/// ```
pub trait Fs:
    FsRead + FsWrite + FsDir + FsLink + FsPermissions + FsStats + FsOpen + FsSync
{
}

impl<T> Fs for T where
    T: FsRead + FsWrite + FsDir + FsLink + FsPermissions + FsStats + FsOpen + FsSync
{
}

/// [`Fs`] plus the optional operations.
///
/// This is what [`Dispatcher`](crate::Dispatcher) and the FUSE adapter are
/// generic over.
pub trait FsFull: Fs + FsAllocate + FsXattr {}

impl<T: Fs + FsAllocate + FsXattr> FsFull for T {}
