//! Append-only audit sink.
//!
//! Every active tick produces one [`AuditRecord`]. [`JsonlAuditLog`] writes
//! them as JSON Lines, one file per UTC day, so the reader in
//! [`crate::reader`] can pick them up with the same directory walk used for
//! any other JSONL data.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use flow_core::error::{FlowError, Result};
use flow_core::models::AuditRecord;
use tracing::debug;

/// Destination for audit records.
pub trait AuditLog: Send {
    fn append(&mut self, record: &AuditRecord) -> Result<()>;
}

// ── JsonlAuditLog ─────────────────────────────────────────────────────────────

/// Writes records to `<dir>/audit-YYYY-MM-DD.jsonl`.
pub struct JsonlAuditLog {
    dir: PathBuf,
    /// Day key and handle of the file currently open for appending.
    current: Option<(String, File)>,
}

impl JsonlAuditLog {
    /// The directory is created lazily on first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a record with the given day key is written to.
    pub fn file_for_day(&self, day_key: &str) -> PathBuf {
        self.dir.join(format!("audit-{day_key}.jsonl"))
    }

    fn writer_for(&mut self, day_key: &str) -> Result<&mut File> {
        let reuse = matches!(&self.current, Some((day, _)) if day == day_key);
        if !reuse {
            let path = self.file_for_day(day_key);
            std::fs::create_dir_all(&self.dir).map_err(|source| FlowError::FileWrite {
                path: self.dir.clone(),
                source,
            })?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| FlowError::FileWrite {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "opened audit file");
            self.current = Some((day_key.to_string(), file));
        }

        match self.current.as_mut() {
            Some((_, file)) => Ok(file),
            None => Err(FlowError::Config("audit file not open".to_string())),
        }
    }
}

impl AuditLog for JsonlAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<()> {
        let day_key = record.timestamp.format("%Y-%m-%d").to_string();
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let path = self.file_for_day(&day_key);
        let file = self.writer_for(&day_key)?;
        file.write_all(line.as_bytes())
            .map_err(|source| FlowError::FileWrite { path, source })?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
