//! Atomic file operations for sync.
//!
//! Exports are written to a temp file, synced to disk, then renamed over
//! the target, so a crash never leaves a half-written export behind.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::sync::types::{SyncError, SyncRecord, SyncResult};

/// Write content to a file atomically.
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SyncResult<()> {
    let temp_path = path.with_extension("jsonl.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Write sync records to a JSONL file atomically, one record per line.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized or the file cannot be written.
pub fn write_jsonl(path: &Path, records: &[SyncRecord]) -> SyncResult<()> {
    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record)?;
        content.push_str(&line);
        content.push('\n');
    }
    atomic_write(path, &content)
}

/// Read all sync records from a JSONL file.
///
/// Blank lines are ignored. Invalid lines cause an error carrying the
/// line number.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - Any line cannot be parsed as a valid `SyncRecord`
pub fn read_jsonl(path: &Path) -> SyncResult<Vec<SyncRecord>> {
    if !path.exists() {
        return Err(SyncError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let record: SyncRecord =
            serde_json::from_str(&line).map_err(|e| SyncError::InvalidRecord {
                line: line_num + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementResult, FormResult};
    use crate::sync::types::FormResultRecord;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn make_record(form_id: &str, millis: i64) -> SyncRecord {
        SyncRecord::FormResult(FormResultRecord {
            form_id: form_id.to_string(),
            data: FormResult::new(Utc.timestamp_millis_opt(millis).unwrap())
                .with_answer(ElementResult::text("q1", "hello")),
            content_hash: "abc123".to_string(),
            exported_at: "2025-01-20T00:00:00Z".to_string(),
        })
    }

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.jsonl");

        atomic_write(&path, "line 1\nline 2\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "line 1\nline 2\n");
        assert!(!path.with_extension("jsonl.tmp").exists());
    }

    #[test]
    fn test_write_then_read_jsonl() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("results.jsonl");

        write_jsonl(&path, &[make_record("f1", 1), make_record("f1", 2)]).unwrap();

        let records = read_jsonl(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.jsonl");
        let line = serde_json::to_string(&make_record("f1", 1)).unwrap();
        fs::write(&path, format!("\n{line}\n   \n")).unwrap();

        assert_eq!(read_jsonl(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.jsonl");
        let line = serde_json::to_string(&make_record("f1", 1)).unwrap();
        fs::write(&path, format!("{line}\nnot json\n")).unwrap();

        let result = read_jsonl(&path);
        assert!(matches!(result, Err(SyncError::InvalidRecord { line: 2, .. })));
    }

    #[test]
    fn test_file_not_found() {
        let result = read_jsonl(Path::new("/nonexistent/file.jsonl"));
        assert!(matches!(result, Err(SyncError::FileNotFound(_))));
    }
}
