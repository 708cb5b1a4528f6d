//! Mount configuration: what to mirror, where, and with which host options.
//!
//! Options arrive as comma-separated `-o` strings, the way `mount(8)` and
//! every FUSE filesystem take them. Names the host runtime knows become typed
//! [`MountOption`]s; anything else is passed through untouched as
//! [`MountOption::CUSTOM`].

use std::path::{Path, PathBuf};

use fuser::MountOption;

/// Everything needed to mount one mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountConfig {
    /// Directory to mirror.
    pub root: PathBuf,
    /// Where to mount it.
    pub mountpoint: PathBuf,
    /// Raw option names, already split on commas.
    pub options: Vec<String>,
    /// Name shown in the mount table. Defaults to the canonical root.
    pub fsname: Option<String>,
    /// Unmount automatically when the process exits.
    pub auto_unmount: bool,
    /// Let other users access the mount.
    pub allow_other: bool,
    /// Mount read-only.
    pub read_only: bool,
}

impl MountConfig {
    /// A config with no extra options.
    pub fn new(root: impl Into<PathBuf>, mountpoint: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mountpoint: mountpoint.into(),
            ..Self::default()
        }
    }

    /// Append the comma-separated options of one `-o` argument.
    ///
    /// `fsname=`, `allow_other`, `auto_unmount`, `ro` and `rw` update the
    /// matching fields; every other name is kept in [`options`](Self::options).
    pub fn push_options(&mut self, options: &str) {
        for option in split_options(options) {
            match option.as_str() {
                "allow_other" => self.allow_other = true,
                "auto_unmount" => self.auto_unmount = true,
                "ro" => self.read_only = true,
                "rw" => self.read_only = false,
                _ => match option.strip_prefix("fsname=") {
                    Some(name) => self.fsname = Some(name.to_owned()),
                    None => self.options.push(option),
                },
            }
        }
    }

    /// Builder form of [`push_options`](Self::push_options).
    pub fn with_options(mut self, options: &str) -> Self {
        self.push_options(options);
        self
    }

    /// The option list handed to the host runtime.
    ///
    /// `canonical_root` names the filesystem unless `fsname` was given.
    pub fn mount_options(&self, canonical_root: &Path) -> Vec<MountOption> {
        let fsname = self
            .fsname
            .clone()
            .unwrap_or_else(|| canonical_root.to_string_lossy().into_owned());

        let mut opts = vec![
            MountOption::FSName(fsname),
            MountOption::Subtype("mirrorfs".to_owned()),
        ];
        opts.push(if self.read_only {
            MountOption::RO
        } else {
            MountOption::RW
        });
        if self.allow_other {
            opts.push(MountOption::AllowOther);
        }
        if self.auto_unmount {
            opts.push(MountOption::AutoUnmount);
        }
        opts.extend(self.options.iter().map(|name| parse_option(name)));
        opts
    }
}

/// Split one `-o` argument into option names, dropping empty pieces.
pub fn split_options(options: &str) -> Vec<String> {
    options
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Map a single option name to the host runtime's typed form.
pub fn parse_option(name: &str) -> MountOption {
    match name {
        "allow_other" => MountOption::AllowOther,
        "allow_root" => MountOption::AllowRoot,
        "auto_unmount" => MountOption::AutoUnmount,
        "default_permissions" => MountOption::DefaultPermissions,
        "dev" => MountOption::Dev,
        "nodev" => MountOption::NoDev,
        "suid" => MountOption::Suid,
        "nosuid" => MountOption::NoSuid,
        "ro" => MountOption::RO,
        "rw" => MountOption::RW,
        "exec" => MountOption::Exec,
        "noexec" => MountOption::NoExec,
        "atime" => MountOption::Atime,
        "noatime" => MountOption::NoAtime,
        "dirsync" => MountOption::DirSync,
        "sync" => MountOption::Sync,
        "async" => MountOption::Async,
        other => {
            if let Some(value) = other.strip_prefix("fsname=") {
                MountOption::FSName(value.to_owned())
            } else if let Some(value) = other.strip_prefix("subtype=") {
                MountOption::Subtype(value.to_owned())
            } else {
                MountOption::CUSTOM(other.to_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_drops_empty_pieces() {
        assert_eq!(split_options("ro,, noatime ,"), vec!["ro", "noatime"]);
        assert!(split_options("").is_empty());
    }

    #[test]
    fn known_names_are_typed() {
        assert_eq!(parse_option("noexec"), MountOption::NoExec);
        assert_eq!(parse_option("default_permissions"), MountOption::DefaultPermissions);
        assert_eq!(
            parse_option("subtype=x"),
            MountOption::Subtype("x".to_owned())
        );
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(
            parse_option("max_read=131072"),
            MountOption::CUSTOM("max_read=131072".to_owned())
        );
    }

    #[test]
    fn push_options_sets_fields() {
        let config = MountConfig::new("/src", "/mnt")
            .with_options("allow_other,fsname=data")
            .with_options("ro,noatime");
        assert!(config.allow_other);
        assert!(config.read_only);
        assert_eq!(config.fsname.as_deref(), Some("data"));
        assert_eq!(config.options, vec!["noatime"]);
    }

    #[test]
    fn later_rw_overrides_ro() {
        let config = MountConfig::new("/src", "/mnt").with_options("ro,rw");
        assert!(!config.read_only);
    }

    #[test]
    fn fsname_defaults_to_root() {
        let config = MountConfig::new("/src", "/mnt");
        let opts = config.mount_options(Path::new("/real/src"));
        assert_eq!(opts[0], MountOption::FSName("/real/src".to_owned()));
        assert!(opts.contains(&MountOption::RW));
        assert!(!opts.contains(&MountOption::AutoUnmount));
    }

    #[test]
    fn mount_options_carry_flags_and_extras() {
        let config = MountConfig::new("/src", "/mnt").with_options("auto_unmount,ro,nosuid,foo=1");
        let opts = config.mount_options(Path::new("/src"));
        assert!(opts.contains(&MountOption::RO));
        assert!(opts.contains(&MountOption::AutoUnmount));
        assert!(opts.contains(&MountOption::NoSuid));
        assert!(opts.contains(&MountOption::CUSTOM("foo=1".to_owned())));
    }
}
