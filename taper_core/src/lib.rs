#![forbid(unsafe_code)]

//! Core domain model and business logic for the Taper tracker.
//!
//! This crate provides:
//! - Domain types (compounds, doses, exercise entries, summaries)
//! - The dose-decay series calculator
//! - Compound registry and per-compound dose ledgers
//! - Exercise journal persistence (WAL, CSV, calendar aggregation)
//! - Exercise catalog

pub mod types;
pub mod error;
pub mod decay;
pub mod compounds;
pub mod ledger;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod journal;
pub mod csv_rollup;
pub mod calendar;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use decay::compute_series;
pub use compounds::CompoundStore;
pub use ledger::{ledger_path, DoseLedger};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use journal::{EntrySink, JsonlSink};
pub use calendar::{day_summary, load_entries, month_summaries, year_stats};
