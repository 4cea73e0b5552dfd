//! Write-Ahead Log (WAL) for exercise journal entries.
//!
//! Entries are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.

use crate::{ExerciseEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Entry sink trait for persisting journal entries
pub trait EntrySink {
    fn append(&mut self, entry: &ExerciseEntry) -> Result<()>;
}

/// JSONL-based entry sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EntrySink for JsonlSink {
    fn append(&mut self, entry: &ExerciseEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended entry {} to journal WAL", entry.id);
        Ok(())
    }
}

/// Read all entries from a WAL file
pub fn read_entries(path: &Path) -> Result<Vec<ExerciseEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ExerciseEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse entry at line {}: {}", line_num + 1, e);
                // Continue reading, don't fail completely
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from journal WAL", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExerciseCategory;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn create_test_entry(exercise: &str) -> ExerciseEntry {
        ExerciseEntry {
            id: Uuid::new_v4(),
            exercise_date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            category: ExerciseCategory::Lifting,
            exercise: exercise.into(),
            stats: Some("4x8 @ 185lbs".into()),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read_single_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let entry = create_test_entry("Bench Press");
        let entry_id = entry.id;

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&entry).unwrap();

        let entries = read_entries(&wal_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry_id);
        assert_eq!(entries[0].exercise, "Bench Press");
    }

    #[test]
    fn test_append_multiple_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        for _ in 0..5 {
            sink.append(&create_test_entry("Squats")).unwrap();
        }

        let entries = read_entries(&wal_path).unwrap();
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_read_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("nonexistent.wal");

        let entries = read_entries(&wal_path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_entry("Deadlifts")).unwrap();

        // Corrupt line in the middle, then a valid one
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
            writeln!(file, "{{ truncated").unwrap();
        }
        sink.append(&create_test_entry("Treadmill")).unwrap();

        let entries = read_entries(&wal_path).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
