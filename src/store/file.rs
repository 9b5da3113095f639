//! Atomic publication of the ledger document.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Replaces the file at `path` with `contents` such that a reader sees either the old file or the
/// new one, never a partial write. The bytes go to a temporary file in the same directory, which
/// is flushed to disk and then renamed over `path`. The directory entry is synced afterwards so
/// the rename itself survives a crash.
///
/// The blocking file operations run on tokio's blocking pool. Once started, the write runs to
/// completion even if the returned future is dropped.
pub(crate) async fn publish(path: &Path, contents: Vec<u8>) -> std::io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || publish_blocking(&path, &contents))
        .await
        .map_err(std::io::Error::other)?
}

fn publish_blocking(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(&dir)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
