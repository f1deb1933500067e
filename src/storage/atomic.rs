//! Crash-safe file replacement: write temp, fsync, rename, fsync directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Replace `path` with `contents` so that a crash leaves either the old file
/// or the new one, never a partial write.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem. Until the rename succeeds the existing file is untouched and the
/// temp file is removed on any error. A failed directory fsync afterwards is
/// only logged.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| e.error)?;
    sync_dir(&dir);
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::warn!(dir = %dir.display(), error = %e, "Failed to fsync directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
