//! # mirrorfs
//!
//! A passthrough filesystem: every operation on the mounted tree is forwarded
//! to the same relative path beneath a real root directory, so the mount is a
//! live mirror of that directory.
//!
//! ---
//!
//! ## Quick Start
//!
//! The backend can be driven directly, without mounting anything:
//!
//! ```rust,no_run
//! use mirrorfs::{FsExt, FsRead, FsWrite, Passthrough};
//! use std::path::Path;
//!
//! fn copy_config(root: &Path) -> Result<(), mirrorfs::FsError> {
//!     let fs = Passthrough::from_root(root)?;
//!     let data = fs.read_to_end(Path::new("/app.toml"))?;
//!     fs.write_all_at(Path::new("/app.toml.bak"), &data, 0)?;
//!     Ok(())
//! }
//! ```
//!
//! Mounting goes through [`mount`]:
//!
//! ```rust,no_run
//! use mirrorfs::MountConfig;
//!
//! let config = MountConfig::new("/srv/data", "/mnt/data").with_options("ro");
//! mirrorfs::mount(&config)?;
//! # Ok::<(), mirrorfs::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MountContext`] | The canonical real root, fixed at startup |
//! | [`PathResolver`] | Virtual path → real path |
//! | [`Fs`] | Core operations: attributes, I/O, directories, links, permissions |
//! | [`FsFull`] | [`Fs`] plus preallocation and extended attributes |
//! | [`Passthrough`] | The real-filesystem implementation of [`FsFull`] |
//! | [`OperationTable`] | Fixed, capability-gated operation slots |
//! | [`Dispatcher`] | Routes a [`Request`] to its slot |
//! | [`MirrorFs`] | Serves a [`Dispatcher`] to the kernel |
//! | [`FsError`] | Error type; every variant maps to one errno |
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! FsRead + FsWrite + FsDir + FsLink + FsPermissions + FsStats + FsOpen + FsSync = Fs
//!                                               ↓
//!                            Fs + FsAllocate + FsXattr = FsFull
//! ```
//!
//! Both composites have blanket implementations.
//!
//! ---
//!
//! ## Errors
//!
//! Operations return `Result<T, FsError>`. At the kernel boundary the error
//! collapses to its errno:
//!
//! ```rust
//! use mirrorfs::FsError;
//!
//! let err = FsError::Unimplemented { operation: "fallocate" };
//! assert_eq!(err.errno(), libc::ENOSYS);
//! assert_eq!(err.to_string(), "operation not implemented: fallocate");
//! ```
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`DirEntry`], [`Permissions`], [`StatFs`] |

mod config;
mod context;
mod error;
mod ext;
mod fuse;
mod ops;
mod passthrough;
mod path_resolver;
mod traits;
mod types;

pub use error::FsError;

pub use types::{DirEntry, FileType, Metadata, Permissions, ROOT_INODE, StatFs, Timestamp};

pub use context::MountContext;
pub use path_resolver::{MAX_PATH_LEN, PathResolver, resolve};

pub use traits::{
    Fs, FsAllocate, FsDir, FsFull, FsLink, FsOpen, FsPermissions, FsRead, FsStats, FsSync,
    FsWrite, FsXattr, ReadDirIter,
};

pub use passthrough::Passthrough;

pub use ops::{
    Capabilities, Dispatcher, FillResult, Handler, OperationKind, OperationTable, Reply, Request,
    status,
};

pub use ext::{FsExt, FsXattrExt};

pub use config::{MountConfig, parse_option, split_options};
pub use fuse::{DirCursor, InodeTable, MirrorFs, TTL, mount};
