//! Per-compound dose ledger persistence with file locking.
//!
//! A ledger is the sparse record of administered doses for one compound:
//! at most one amount per calendar date. Writes go through `upsert`, which
//! replaces any earlier amount for the same date rather than adding to it.
//! Zeroing a date is done by upserting `0.0`; the row may remain in the
//! file, but it contributes nothing to a computed series.

use crate::types::Dose;
use crate::{Error, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// The dose ledger for a single compound
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DoseLedger {
    #[serde(default)]
    doses: BTreeMap<NaiveDate, f64>,
}

/// Path of the ledger file for a compound under the data directory
pub fn ledger_path(data_dir: &Path, compound_id: Uuid) -> PathBuf {
    data_dir.join("ledgers").join(format!("{}.json", compound_id))
}

impl DoseLedger {
    /// Load a ledger from a file with shared locking
    ///
    /// Returns an empty ledger if the file doesn't exist (a compound with no
    /// doses logged yet). If the file is corrupted, logs a warning and
    /// returns an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No ledger file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open ledger {:?}: {}. Starting empty.", path, e);
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock ledger {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read ledger {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<DoseLedger>(&contents) {
            Ok(ledger) => {
                tracing::debug!("Loaded {} ledger entries from {:?}", ledger.doses.len(), path);
                Ok(ledger)
            }
            Err(e) => {
                tracing::warn!("Failed to parse ledger {:?}: {}. Starting empty.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save the ledger to a file with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "ledger path missing parent")
        })?)?;

        // Exclusive lock on the temp file serializes concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved ledger to {:?}", path);
        Ok(())
    }

    /// Load a ledger, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut DoseLedger) -> Result<()>,
    {
        let mut ledger = Self::load(path)?;
        f(&mut ledger)?;
        ledger.save(path)?;
        Ok(ledger)
    }

    /// Insert or replace the amount for a date
    ///
    /// This is the sole mutation path into the ledger: a second write for
    /// the same date overwrites the first, it never accumulates. Returns
    /// the amount that was replaced, if any.
    pub fn upsert(&mut self, date: NaiveDate, amount: f64) -> Option<f64> {
        let previous = self.doses.insert(date, amount);
        match previous {
            Some(old) => tracing::debug!("Replaced dose on {}: {} -> {}", date, old, amount),
            None => tracing::debug!("Recorded dose on {}: {}", date, amount),
        }
        previous
    }

    /// Amount recorded for a date, if any
    pub fn amount_on(&self, date: NaiveDate) -> Option<f64> {
        self.doses.get(&date).copied()
    }

    /// All ledger entries in ascending date order
    pub fn doses(&self) -> Vec<Dose> {
        self.doses
            .iter()
            .map(|(&dose_date, &dose_amount)| Dose {
                dose_date,
                dose_amount,
            })
            .collect()
    }

    /// Number of dated entries (including zeroed ones)
    pub fn len(&self) -> usize {
        self.doses.len()
    }

    /// True if no dates have ever been written
    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::compute_series;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");

        let mut ledger = DoseLedger::default();
        ledger.upsert(date(2026, 1, 1), 100.0);
        ledger.upsert(date(2026, 1, 5), 50.0);
        ledger.save(&path).unwrap();

        let loaded = DoseLedger::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.amount_on(date(2026, 1, 1)), Some(100.0));
        assert_eq!(loaded.amount_on(date(2026, 1, 5)), Some(50.0));
    }

    #[test]
    fn test_upsert_overwrites_not_accumulates() {
        let mut ledger = DoseLedger::default();
        ledger.upsert(date(2026, 1, 1), 30.0);
        let previous = ledger.upsert(date(2026, 1, 1), 50.0);

        assert_eq!(previous, Some(30.0));
        assert_eq!(ledger.amount_on(date(2026, 1, 1)), Some(50.0));
        assert_eq!(ledger.len(), 1);

        // A recomputation reflects only the surviving amount.
        let rows = compute_series(date(2026, 1, 1), 1.0, &ledger.doses(), date(2026, 1, 1));
        assert_eq!(rows[0].active_dose, 50.0);
    }

    #[test]
    fn test_zeroed_date_contributes_nothing() {
        let mut ledger = DoseLedger::default();
        ledger.upsert(date(2026, 1, 1), 100.0);
        ledger.upsert(date(2026, 1, 1), 0.0);

        // The row persists with amount zero, but the series sees no dose.
        assert_eq!(ledger.amount_on(date(2026, 1, 1)), Some(0.0));
        let rows = compute_series(date(2026, 1, 1), 1.0, &ledger.doses(), date(2026, 1, 2));
        assert_eq!(rows[0].active_dose, 0.0);
        assert_eq!(rows[1].active_dose, 0.0);
    }

    #[test]
    fn test_doses_sorted_ascending() {
        let mut ledger = DoseLedger::default();
        ledger.upsert(date(2026, 3, 1), 3.0);
        ledger.upsert(date(2026, 1, 1), 1.0);
        ledger.upsert(date(2026, 2, 1), 2.0);

        let doses = ledger.doses();
        assert_eq!(doses[0].dose_date, date(2026, 1, 1));
        assert_eq!(doses[1].dose_date, date(2026, 2, 1));
        assert_eq!(doses[2].dose_date, date(2026, 3, 1));
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = DoseLedger::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupted_ledger_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ not json }").unwrap();

        let ledger = DoseLedger::load(&path).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");

        DoseLedger::update(&path, |ledger| {
            ledger.upsert(date(2026, 1, 1), 25.0);
            Ok(())
        })
        .unwrap();

        let loaded = DoseLedger::load(&path).unwrap();
        assert_eq!(loaded.amount_on(date(2026, 1, 1)), Some(25.0));
    }

    #[test]
    fn test_ledger_path_layout() {
        let id = Uuid::new_v4();
        let path = ledger_path(Path::new("/tmp/data"), id);
        assert_eq!(path, PathBuf::from(format!("/tmp/data/ledgers/{}.json", id)));
    }
}
