//! CSV rollup functionality for archiving journal WAL entries.
//!
//! This module implements atomic WAL-to-CSV conversion with proper error
//! handling to prevent data loss.

use crate::{ExerciseEntry, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    exercise_date: String,
    category: String,
    exercise: String,
    stats: Option<String>,
    notes: Option<String>,
    created_at: String,
}

impl From<&ExerciseEntry> for CsvRow {
    fn from(entry: &ExerciseEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            exercise_date: entry.exercise_date.to_string(),
            category: entry.category.to_string(),
            exercise: entry.exercise.clone(),
            stats: entry.stats.clone(),
            notes: entry.notes.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Roll up WAL entries into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all entries from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of entries processed
///
/// # Safety
/// - CSV is fsynced before WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
/// - Processed WAL files can be cleaned up separately
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = crate::journal::read_entries(wal_path)?;

    if entries.is_empty() {
        tracing::info!("No entries in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is brand new
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in &entries {
        let row = CsvRow::from(entry);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} entries to CSV", entries.len());

    // Atomically archive the WAL by renaming it
    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(entries.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed WAL: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
