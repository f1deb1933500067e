//! Append-only request history stored as JSON lines.
//!
//! Each append is fsynced before returning. Reads skip lines that fail to
//! parse, so a torn final line left by a crash never hides earlier entries.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::HistoryEntry;

fn trim_line(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &line[start..end]
}

/// True when the file has content whose last byte is not a newline, i.e. a
/// previous append was torn mid-line.
fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// History log bound to one file path
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one entry as a single compact JSON line
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut line =
            serde_json::to_string(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        // Keep a torn tail from swallowing this entry
        if ends_mid_line(&mut file)? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        tracing::debug!(path = %self.path.display(), name = %entry.name, "History entry appended");
        Ok(())
    }

    /// Read entries in append order.
    ///
    /// With `limit` of `Some(n)` where `n > 0`, only the last `n` entries are
    /// returned. A missing file reads as an empty history.
    pub fn load(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let limit = limit.filter(|n| *n > 0);
        let mut entries = VecDeque::new();
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let line = trim_line(&buf);
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<HistoryEntry>(line) {
                Ok(entry) => {
                    if let Some(max) = limit {
                        if entries.len() >= max {
                            entries.pop_front();
                        }
                    }
                    entries.push_back(entry);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = line_no,
                        error = %e,
                        "Skipping unreadable history line"
                    );
                }
            }
        }

        Ok(entries.into())
    }
}

/// Append one entry to the log at `path`
pub fn append_history_entry(path: impl Into<PathBuf>, entry: &HistoryEntry) -> Result<(), StoreError> {
    HistoryLog::new(path).append(entry)
}

/// Read the log at `path`, keeping only the last `limit` entries when given
pub fn load_history(path: impl Into<PathBuf>, limit: Option<usize>) -> Result<Vec<HistoryEntry>, StoreError> {
    HistoryLog::new(path).load(limit)
}
