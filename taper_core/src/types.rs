//! Core domain types for the Taper tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Compounds and their decay parameters
//! - Dose ledger entries and computed series rows
//! - Exercise journal entries and calendar summaries
//! - Exercise catalog records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Compound Types
// ============================================================================

/// A tracked compound with its decay parameters.
///
/// `start_date` is the epoch of the decay simulation: the first simulated
/// day, assigned index 1. `half_life_days` must be positive; the compound
/// editing boundary enforces this before a compound is ever persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Compound {
    pub id: Uuid,
    pub name: String,
    pub half_life_days: f64,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A single dose ledger entry: the amount administered on one date.
///
/// The ledger holds at most one amount per date; a later write for the same
/// date replaces the earlier one. An amount of `0.0` means "no contribution
/// that day", equivalent to the date being absent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    pub dose_date: NaiveDate,
    pub dose_amount: f64,
}

/// One computed day of the dose-decay series (derived, never persisted).
///
/// `active_dose` is the amount present as of this day, after adding the
/// day's dose to the carry-over from the previous day. `calculated_next` is
/// what that amount decays to by the following day. `added_dose` is the raw
/// amount administered this day, `0.0` if none.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CalculatedDoseRow {
    pub date: NaiveDate,
    pub index: usize,
    pub active_dose: f64,
    pub calculated_next: f64,
    pub added_dose: f64,
}

// ============================================================================
// Exercise Journal Types
// ============================================================================

/// Category of a logged exercise entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Lifting,
    Cardio,
}

impl ExerciseCategory {
    /// Parse a user-supplied category string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lifting" => Some(ExerciseCategory::Lifting),
            "cardio" => Some(ExerciseCategory::Cardio),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseCategory::Lifting => write!(f, "lifting"),
            ExerciseCategory::Cardio => write!(f, "cardio"),
        }
    }
}

/// A recorded workout entry on the calendar
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub exercise_date: NaiveDate,
    pub category: ExerciseCategory,
    pub exercise: String,
    /// Quantitative notes, e.g. "4x8 @ 185lbs" or "30 min, 3.2 miles"
    pub stats: Option<String>,
    /// Free-form qualitative notes
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-day rollup of journal entries for calendar views
#[derive(Clone, Debug, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub has_lifting: bool,
    pub has_cardio: bool,
    pub entries: Vec<ExerciseEntry>,
}

/// Yearly aggregate counts, one bucket per active day.
///
/// `per_day` maps a date to its (lifting, cardio) entry counts. This is the
/// data behind the yearly activity view; how it is colored or rendered is up
/// to the consumer.
#[derive(Clone, Debug, Default, Serialize)]
pub struct YearStats {
    pub year: i32,
    pub lifting_count: usize,
    pub cardio_count: usize,
    pub per_day: BTreeMap<NaiveDate, DayCounts>,
}

/// Entry counts for a single day
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct DayCounts {
    pub lifting: usize,
    pub cardio: usize,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// A known exercise definition in the catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub name: String,
    pub category: ExerciseCategory,
    pub targets: Vec<String>,
}

/// The catalog of known exercises, keyed by lowercase name
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: BTreeMap<String, ExerciseSpec>,
}
