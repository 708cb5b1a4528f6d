//! Driving the operation table without a mount.
//!
//! A `Dispatcher<Passthrough>` is rooted in a scratch directory and fed the
//! same requests the kernel adapter would send. Every change shows up in the
//! real directory.
//!
//! Run with: `cargo run --example mirror_dir`

use mirrorfs::*;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== mirrorfs dispatcher example ===\n");

    let scratch = tempfile::tempdir()?;
    let backend = Passthrough::from_root(scratch.path())?;
    let fs = Dispatcher::new(backend, Capabilities::detect());
    println!("Mirroring {}", scratch.path().display());
    println!("Capabilities: {:?}", fs.table().capabilities());

    // --- Creating a file ---
    println!("\n1. mknod /notes.txt");
    fs.dispatch(Request::Mknod {
        path: Path::new("/notes.txt"),
        mode: libc::S_IFREG as u32 | 0o644,
        rdev: 0,
    })?;

    // --- Writing and reading back ---
    println!("\n2. write + read");
    let reply = fs.dispatch(Request::Write {
        path: Path::new("/notes.txt"),
        data: b"mirrored through the table",
        offset: 0,
    })?;
    println!("   write replied {reply:?}");

    let mut buf = [0u8; 64];
    if let Reply::Count(n) = fs.dispatch(Request::Read {
        path: Path::new("/notes.txt"),
        buf: &mut buf,
        offset: 0,
    })? {
        println!("   read back: {}", String::from_utf8_lossy(&buf[..n]));
    }
    let real = std::fs::read_to_string(scratch.path().join("notes.txt"))?;
    println!("   real file holds: {real}");

    // --- Directories ---
    println!("\n3. mkdir /sub, then readdir /");
    fs.dispatch(Request::Mkdir {
        path: Path::new("/sub"),
        mode: 0o755,
    })?;
    let mut filler = |entry: &DirEntry| {
        println!("   {:?} ino={} type={:?}", entry.name, entry.inode, entry.file_type);
        FillResult::Continue
    };
    fs.dispatch(Request::Readdir {
        path: Path::new("/"),
        filler: &mut filler,
    })?;

    // --- Attributes ---
    println!("\n4. getattr /notes.txt");
    if let Reply::Attr(meta) = fs.dispatch(Request::Getattr {
        path: Path::new("/notes.txt"),
    })? {
        println!(
            "   type={:?} size={} mode={:o}",
            meta.file_type,
            meta.size,
            meta.permissions.mode()
        );
    }

    // --- Errors ---
    println!("\n5. getattr /missing");
    let result = fs.dispatch(Request::Getattr {
        path: Path::new("/missing"),
    });
    match &result {
        Ok(reply) => println!("   unexpected reply {reply:?}"),
        Err(e) => println!("   status {} ({e})", status(&result)),
    }

    println!("\n=== done ===");
    Ok(())
}
