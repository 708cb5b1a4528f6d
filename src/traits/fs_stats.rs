//! Capacity reporting for the filesystem behind a path.

use std::path::Path;

use crate::{FsError, StatFs};

/// Reports block and inode usage, as `statvfs(3)` does.
///
/// The answer describes whichever filesystem holds `path`, so two paths of
/// one mirror can report different numbers when the real tree spans mounts.
pub trait FsStats: Send + Sync {
    /// Usage figures for the filesystem holding `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Os`] with `ENOENT` if `path` does not exist
    fn statfs(&self, path: &Path) -> Result<StatFs, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl FsStats for Fixed {
        fn statfs(&self, path: &Path) -> Result<StatFs, FsError> {
            if path == Path::new("/") {
                Ok(StatFs {
                    block_size: 4096,
                    blocks: 100,
                    blocks_free: 40,
                    ..StatFs::default()
                })
            } else {
                Err(FsError::os(
                    "statfs",
                    path,
                    std::io::Error::from_raw_os_error(libc::ENOENT),
                ))
            }
        }
    }

    #[test]
    fn usable_through_dyn() {
        let fs: &dyn FsStats = &Fixed;
        let st = fs.statfs(Path::new("/")).unwrap();
        assert_eq!(st.block_size * st.blocks_free, 163_840);
        assert_eq!(fs.statfs(Path::new("/gone")).unwrap_err().errno(), libc::ENOENT);
    }
}
