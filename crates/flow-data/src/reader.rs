//! Audit-log discovery and loading.
//!
//! Reads the JSONL files written by [`crate::audit::JsonlAuditLog`] back into
//! [`AuditRecord`]s for reporting.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flow_core::models::AuditRecord;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `dir`, sorted by path.
pub fn find_audit_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Audit directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load audit records from every JSONL file under `dir`.
///
/// * `hours_back` – when set, only records within the last N hours are kept.
///
/// Malformed lines are skipped. The result is sorted by timestamp.
pub fn load_audit_records(dir: &Path, hours_back: Option<u64>) -> Vec<AuditRecord> {
    let cutoff: Option<DateTime<Utc>> =
        hours_back.map(|h| Utc::now() - chrono::Duration::hours(h as i64));

    let files = find_audit_files(dir);
    if files.is_empty() {
        debug!("No audit files found in {}", dir.display());
        return Vec::new();
    }

    let mut records: Vec<AuditRecord> = files
        .iter()
        .flat_map(|path| read_single_file(path, cutoff))
        .collect();

    records.sort_by_key(|r| r.timestamp);

    debug!(
        "Loaded {} audit records from {} files",
        records.len(),
        files.len()
    );
    records
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_single_file(path: &Path, cutoff: Option<DateTime<Utc>>) -> Vec<AuditRecord> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to read file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    let mut skipped = 0u64;

    for line in std::io::BufReader::new(file).lines() {
        let Ok(line) = line else { continue };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<AuditRecord>(trimmed) {
            Ok(record) => {
                if cutoff.map_or(true, |c| record.timestamp >= c) {
                    records.push(record);
                }
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(
            "Skipped {} malformed lines in {}",
            skipped,
            path.display()
        );
    }
    records
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLog, JsonlAuditLog};
    use flow_core::models::SessionState;
    use std::fs;
    use tempfile::TempDir;

    fn write_jsonl(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn line(ts: &str, app: &str, state: &str) -> String {
        format!(r#"{{"timestamp":"{ts}","active_app":"{app}","score":64,"state":"{state}"}}"#)
    }

    #[test]
    fn test_find_audit_files_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        write_jsonl(tmp.path(), "b/audit-2026-03-02.jsonl", &["{}"]);
        write_jsonl(tmp.path(), "a/audit-2026-03-01.jsonl", &["{}"]);
        write_jsonl(tmp.path(), "notes.txt", &["ignored"]);

        let files = find_audit_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a/audit-2026-03-01.jsonl"));
        assert!(files[1].ends_with("b/audit-2026-03-02.jsonl"));
    }

    #[test]
    fn test_find_audit_files_nonexistent_path() {
        assert!(find_audit_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_load_audit_records_sorted_and_malformed_skipped() {
        let tmp = TempDir::new().unwrap();
        let late = line("2026-03-01T10:00:05Z", "Code", "FOCUS");
        let early = line("2026-03-01T10:00:01Z", "Code", "TRACKING");
        write_jsonl(tmp.path(), "audit-2026-03-01.jsonl", &[&late, "{broken", "", &early]);

        let records = load_audit_records(tmp.path(), None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, SessionState::Tracking);
        assert_eq!(records[1].state, SessionState::Focus);
    }

    #[test]
    fn test_load_audit_records_hours_back_filter() {
        let tmp = TempDir::new().unwrap();
        let recent = (Utc::now() - chrono::Duration::minutes(5)).to_rfc3339();
        let old = (Utc::now() - chrono::Duration::hours(48)).to_rfc3339();
        let recent_line = line(&recent, "Code", "FOCUS");
        let old_line = line(&old, "Code", "WARN");
        write_jsonl(tmp.path(), "audit.jsonl", &[&old_line, &recent_line]);

        let records = load_audit_records(tmp.path(), Some(24));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, SessionState::Focus);
    }

    #[test]
    fn test_reads_back_what_the_audit_log_wrote() {
        let tmp = TempDir::new().unwrap();
        let mut log = JsonlAuditLog::new(tmp.path());
        let written = AuditRecord {
            timestamp: "2026-03-01T08:15:00Z".parse().unwrap(),
            active_app: Some("Code".to_string()),
            score: 100,
            state: SessionState::Focus,
            tick_ms: 1_000,
        };
        log.append(&written).unwrap();

        assert_eq!(load_audit_records(tmp.path(), None), vec![written]);
    }

    #[test]
    fn test_load_audit_records_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(load_audit_records(tmp.path(), None).is_empty());
    }
}
