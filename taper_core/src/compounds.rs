//! Compound registry persistence with file locking.
//!
//! The registry holds every tracked compound and is the validation boundary
//! for compound parameters: a compound with an empty name or a non-positive
//! half-life is rejected here, before anything reaches disk or the series
//! calculator. Downstream code may therefore assume `half_life_days > 0`.

use crate::types::Compound;
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// All registered compounds, keyed by id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompoundStore {
    #[serde(default)]
    compounds: HashMap<Uuid, Compound>,
}

/// Reject invalid compound parameters before they are persisted
fn validate(name: &str, half_life_days: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Compound("compound name must not be empty".into()));
    }
    if !half_life_days.is_finite() || half_life_days <= 0.0 {
        return Err(Error::Compound(format!(
            "half-life must be a positive number of days, got {}",
            half_life_days
        )));
    }
    Ok(())
}

impl CompoundStore {
    /// Load the registry from a file with shared locking
    ///
    /// Returns an empty registry if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No compound registry at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open compound registry {:?}: {}. Starting empty.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock compound registry {:?}: {}. Starting empty.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read compound registry {:?}: {}. Starting empty.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<CompoundStore>(&contents) {
            Ok(store) => {
                tracing::debug!("Loaded {} compounds from {:?}", store.compounds.len(), path);
                Ok(store)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse compound registry {:?}: {}. Starting empty.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the registry to a file with exclusive locking
    ///
    /// Atomically writes via a locked temp file renamed over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "registry path missing parent")
        })?)?;

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

        tracing::debug!("Saved compound registry to {:?}", path);
        Ok(())
    }

    /// Load the registry, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut CompoundStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }

    /// Register a new compound after validating its parameters
    pub fn add(
        &mut self,
        name: &str,
        half_life_days: f64,
        start_date: NaiveDate,
    ) -> Result<Compound> {
        validate(name, half_life_days)?;

        if self.find_by_name(name).is_some() {
            return Err(Error::Compound(format!(
                "a compound named '{}' already exists",
                name.trim()
            )));
        }

        let compound = Compound {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            half_life_days,
            start_date,
            created_at: Utc::now(),
        };

        tracing::info!(
            "Registered compound '{}' (t1/2 {} days, start {})",
            compound.name,
            compound.half_life_days,
            compound.start_date
        );

        self.compounds.insert(compound.id, compound.clone());
        Ok(compound)
    }

    /// Edit an existing compound; unset fields keep their current values
    pub fn edit(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        half_life_days: Option<f64>,
        start_date: Option<NaiveDate>,
    ) -> Result<Compound> {
        let current = self
            .compounds
            .get(&id)
            .ok_or_else(|| Error::Compound(format!("no compound with id {}", id)))?;

        let new_name = name.unwrap_or(&current.name).to_string();
        let new_half_life = half_life_days.unwrap_or(current.half_life_days);
        validate(&new_name, new_half_life)?;

        if let Some(other) = self.find_by_name(&new_name) {
            if other.id != id {
                return Err(Error::Compound(format!(
                    "a compound named '{}' already exists",
                    new_name.trim()
                )));
            }
        }

        let entry = self.compounds.get_mut(&id).ok_or_else(|| {
            Error::Compound(format!("no compound with id {}", id))
        })?;
        entry.name = new_name.trim().to_string();
        entry.half_life_days = new_half_life;
        if let Some(start) = start_date {
            entry.start_date = start;
        }

        Ok(entry.clone())
    }

    /// Remove a compound, returning the removed record
    pub fn remove(&mut self, id: Uuid) -> Result<Compound> {
        self.compounds
            .remove(&id)
            .ok_or_else(|| Error::Compound(format!("no compound with id {}", id)))
    }

    /// Look up a compound by id
    pub fn get(&self, id: Uuid) -> Option<&Compound> {
        self.compounds.get(&id)
    }

    /// Look up a compound by name, case-insensitively
    pub fn find_by_name(&self, name: &str) -> Option<&Compound> {
        let needle = name.trim().to_lowercase();
        self.compounds
            .values()
            .find(|c| c.name.to_lowercase() == needle)
    }

    /// Resolve a user-supplied selector: a compound id or a name
    pub fn resolve(&self, selector: &str) -> Result<&Compound> {
        if let Ok(id) = Uuid::parse_str(selector.trim()) {
            if let Some(compound) = self.compounds.get(&id) {
                return Ok(compound);
            }
        }
        self.find_by_name(selector).ok_or_else(|| {
            Error::Compound(format!("no compound matching '{}'", selector.trim()))
        })
    }

    /// All compounds, sorted by name
    pub fn list(&self) -> Vec<&Compound> {
        let mut all: Vec<_> = self.compounds.values().collect();
        all.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        all
    }

    /// Number of registered compounds
    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    /// True if no compounds are registered
    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }
}
