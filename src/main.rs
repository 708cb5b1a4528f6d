//! mirrorfs binary.
//!
//! Usage:
//!   mirrorfs [-d] [-o opt[,opt...]]... ROOT MOUNTPOINT
//!
//! Unmount with `fusermount -u MOUNTPOINT`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use mirrorfs::MountConfig;

/// Mirror a directory tree at a mount point.
#[derive(Parser, Debug)]
#[command(name = "mirrorfs")]
#[command(about = "Passthrough filesystem mirroring ROOT at MOUNTPOINT")]
struct Args {
    /// Mount options, comma separated (repeatable)
    #[arg(short = 'o', value_name = "OPTIONS")]
    options: Vec<String>,

    /// Log every operation
    #[arg(short, long)]
    debug: bool,

    /// Stay in the foreground (always the case; accepted for compatibility)
    #[arg(short, long)]
    foreground: bool,

    /// Directory to mirror
    root: PathBuf,

    /// Where to mount it
    mountpoint: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = MountConfig::new(args.root, args.mountpoint);
    for arg in &args.options {
        config.push_options(arg);
    }

    if let Err(e) = mirrorfs::mount(&config) {
        tracing::error!(error = %e, "mirrorfs exited");
        return Err(e.into());
    }
    tracing::info!("unmounted");
    Ok(())
}
