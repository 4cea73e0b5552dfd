//! Journal history loading and calendar aggregation.
//!
//! This module merges journal entries from both WAL and CSV archives and
//! rolls them up into the per-day and per-year shapes the calendar and
//! stats views consume.

use crate::{DayCounts, DaySummary, ExerciseCategory, ExerciseEntry, Result, YearStats};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived entries
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    exercise_date: String,
    category: String,
    exercise: String,
    stats: Option<String>,
    notes: Option<String>,
    created_at: String,
}

impl TryFrom<CsvRow> for ExerciseEntry {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let exercise_date = NaiveDate::parse_from_str(&row.exercise_date, "%Y-%m-%d")
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?;

        let category = ExerciseCategory::parse(&row.category)
            .ok_or_else(|| crate::Error::Other(format!("Invalid category: {}", row.category)))?;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| crate::Error::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(ExerciseEntry {
            id,
            exercise_date,
            category,
            exercise: row.exercise,
            stats: row.stats,
            notes: row.notes,
            created_at,
        })
    }
}

/// First and last day of a calendar month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_month.pred_opt()?))
}

/// Load journal entries within an inclusive date range from both WAL and CSV
///
/// Returns entries sorted by date, then by creation time within a day.
/// Automatically deduplicates entries that appear in both WAL and CSV.
pub fn load_entries(
    wal_path: &Path,
    csv_path: &Path,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ExerciseEntry>> {
    let mut entries = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from WAL first (most recent)
    if wal_path.exists() {
        let wal_entries = crate::journal::read_entries(wal_path)?;
        for entry in wal_entries {
            if entry.exercise_date >= from && entry.exercise_date <= to {
                seen_ids.insert(entry.id);
                entries.push(entry);
            }
        }
        tracing::debug!("Loaded {} entries from WAL", entries.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let csv_entries = load_entries_from_csv(csv_path)?;
        let mut csv_count = 0;
        for entry in csv_entries {
            if entry.exercise_date >= from
                && entry.exercise_date <= to
                && !seen_ids.contains(&entry.id)
            {
                seen_ids.insert(entry.id);
                entries.push(entry);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} entries from CSV", csv_count);
    }

    entries.sort_by(|a, b| {
        a.exercise_date
            .cmp(&b.exercise_date)
            .then(a.created_at.cmp(&b.created_at))
    });

    tracing::info!(
        "Loaded {} total entries between {} and {}",
        entries.len(),
        from,
        to
    );

    Ok(entries)
}

/// Load all entries from a CSV archive
fn load_entries_from_csv(path: &Path) -> Result<Vec<ExerciseEntry>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match ExerciseEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(entries)
}

/// Roll a slice of entries up into one day's summary
pub fn day_summary(entries: &[ExerciseEntry], date: NaiveDate) -> DaySummary {
    let day_entries: Vec<ExerciseEntry> = entries
        .iter()
        .filter(|e| e.exercise_date == date)
        .cloned()
        .collect();

    DaySummary {
        date,
        has_lifting: day_entries
            .iter()
            .any(|e| e.category == ExerciseCategory::Lifting),
        has_cardio: day_entries
            .iter()
            .any(|e| e.category == ExerciseCategory::Cardio),
        entries: day_entries,
    }
}

/// One summary per calendar day of a month, in order
pub fn month_summaries(
    entries: &[ExerciseEntry],
    year: i32,
    month: u32,
) -> Option<Vec<DaySummary>> {
    let (first, last) = month_bounds(year, month)?;
    Some(
        first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|d| day_summary(entries, d))
            .collect(),
    )
}

/// Aggregate a year's entries into total and per-day counts
pub fn year_stats(entries: &[ExerciseEntry], year: i32) -> YearStats {
    let mut stats = YearStats {
        year,
        ..YearStats::default()
    };

    for entry in entries.iter().filter(|e| e.exercise_date.year() == year) {
        let counts = stats
            .per_day
            .entry(entry.exercise_date)
            .or_insert_with(DayCounts::default);
        match entry.category {
            ExerciseCategory::Lifting => {
                counts.lifting += 1;
                stats.lifting_count += 1;
            }
            ExerciseCategory::Cardio => {
                counts.cardio += 1;
                stats.cardio_count += 1;
            }
        }
    }

    stats
}
