//! # Storage
//!
//! Writing favicon files to disk. Each write goes to its own temporary file
//! in the destination directory which is then renamed over the final name,
//! a partially written icon is never visible under its final name

use std::{
    ffi::OsString,
    io::{self, Write},
    path::Path,
};

use bytes::Bytes;
use tokio::fs;

/// Suffix of the temporary files written before the rename
pub const TEMP_SUFFIX: &str = ".part";

/// Whether a file already exists at `path`
pub async fn file_exists(path: &Path) -> io::Result<bool> {
    fs::try_exists(path).await
}

/// Writes `bytes` to `path` replacing any existing file
///
/// Concurrent writes to the same path each use their own temporary file, the
/// last rename wins and the file always holds one complete write
pub async fn write_atomic(path: &Path, bytes: Bytes) -> io::Result<()> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &bytes))
        .await
        .map_err(io::Error::other)?
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Hidden `.{name}.{random}.part` next to the target
    let mut prefix = OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
        prefix.push(".");
    }

    // Removed on drop when any step fails
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(directory)?;

    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;

    Ok(())
}
