use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use taper_core::*;

#[derive(Parser)]
#[command(name = "taper")]
#[command(about = "Personal fitness and compound dose tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tracked compounds
    Compound {
        #[command(subcommand)]
        action: CompoundAction,
    },

    /// Record (or overwrite) the dose for a compound on a date
    Dose {
        /// Compound name or id
        compound: String,

        /// Dose date (YYYY-MM-DD)
        date: String,

        /// Administered amount; 0 clears the day
        amount: f64,
    },

    /// Compute and display the dose-decay series for a compound
    Series {
        /// Compound name or id
        compound: String,

        /// Forecast horizon in days from today (must be a configured choice)
        #[arg(long, conflicts_with = "end")]
        horizon: Option<i64>,

        /// Explicit end date (YYYY-MM-DD) instead of a horizon
        #[arg(long)]
        end: Option<String>,

        /// Emit raw unrounded rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log a workout entry to the journal
    Log {
        /// Entry category (lifting, cardio)
        category: String,

        /// Exercise name
        exercise: String,

        /// Entry date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Quantitative notes, e.g. "4x8 @ 185lbs"
        #[arg(long)]
        stats: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show journal entries for a single day
    Day {
        /// Date (YYYY-MM-DD)
        date: String,
    },

    /// Show day-by-day activity for a calendar month
    Month {
        year: i32,
        month: u32,
    },

    /// Show yearly activity totals
    Stats {
        year: i32,
    },

    /// Roll up journal WAL entries to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum CompoundAction {
    /// Register a new compound
    Add {
        #[arg(long)]
        name: String,

        /// Half-life in days (must be positive)
        #[arg(long)]
        half_life: f64,

        /// First simulated day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start_date: Option<String>,
    },

    /// Edit an existing compound
    Edit {
        /// Compound name or id
        compound: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        half_life: Option<f64>,

        #[arg(long)]
        start_date: Option<String>,
    },

    /// Remove a compound and its dose ledger
    Rm {
        /// Compound name or id
        compound: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// List registered compounds
    List,
}

fn main() -> Result<()> {
    // Initialize logging
    taper_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Compound { action } => cmd_compound(data_dir, action),
        Commands::Dose {
            compound,
            date,
            amount,
        } => cmd_dose(data_dir, &compound, &date, amount),
        Commands::Series {
            compound,
            horizon,
            end,
            json,
        } => cmd_series(data_dir, &compound, horizon, end.as_deref(), json, &config),
        Commands::Log {
            category,
            exercise,
            date,
            stats,
            notes,
        } => cmd_log(
            data_dir,
            &category,
            &exercise,
            date.as_deref(),
            stats,
            notes,
            &config,
        ),
        Commands::Day { date } => cmd_day(data_dir, &date),
        Commands::Month { year, month } => cmd_month(data_dir, year, month),
        Commands::Stats { year } => cmd_stats(data_dir, year),
        Commands::Rollup { cleanup } => cmd_rollup(data_dir, cleanup),
    }
}

fn registry_path(data_dir: &Path) -> PathBuf {
    data_dir.join("compounds.json")
}

fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join("wal").join("exercise_entries.wal")
}

fn csv_path(data_dir: &Path) -> PathBuf {
    data_dir.join("entries.csv")
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("invalid date '{}': {} (expected YYYY-MM-DD)", s, e)))
}

/// Local calendar date; the whole system is timezone-naive by design
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn cmd_compound(data_dir: PathBuf, action: CompoundAction) -> Result<()> {
    let path = registry_path(&data_dir);
    let mut store = CompoundStore::load(&path)?;

    match action {
        CompoundAction::Add {
            name,
            half_life,
            start_date,
        } => {
            let start = match start_date {
                Some(ref s) => parse_date(s)?,
                None => today(),
            };
            let compound = store.add(&name, half_life, start)?;
            store.save(&path)?;

            println!("✓ Registered '{}'", compound.name);
            println!("  id:        {}", compound.id);
            println!("  half-life: {} days", compound.half_life_days);
            println!("  start:     {} (index 1)", compound.start_date);
        }

        CompoundAction::Edit {
            compound,
            name,
            half_life,
            start_date,
        } => {
            let id = store.resolve(&compound)?.id;
            let start = match start_date {
                Some(ref s) => Some(parse_date(s)?),
                None => None,
            };
            let edited = store.edit(id, name.as_deref(), half_life, start)?;
            store.save(&path)?;

            println!("✓ Updated '{}'", edited.name);
            println!("  half-life: {} days", edited.half_life_days);
            println!("  start:     {}", edited.start_date);
        }

        CompoundAction::Rm { compound, yes } => {
            let target = store.resolve(&compound)?.clone();

            if !yes && !prompt_confirm(&format!("Delete '{}' and its dose ledger?", target.name))?
            {
                println!("Aborted.");
                return Ok(());
            }

            store.remove(target.id)?;
            store.save(&path)?;

            let ledger = ledger_path(&data_dir, target.id);
            if ledger.exists() {
                std::fs::remove_file(&ledger)?;
                tracing::info!("Removed ledger file {:?}", ledger);
            }

            println!("✓ Removed '{}'", target.name);
        }

        CompoundAction::List => {
            if store.is_empty() {
                println!("No compounds registered yet. Use 'taper compound add'.");
                return Ok(());
            }

            for compound in store.list() {
                println!(
                    "{}  t½ {} days  start {}  ({})",
                    compound.name, compound.half_life_days, compound.start_date, compound.id
                );
            }
        }
    }

    Ok(())
}

fn cmd_dose(data_dir: PathBuf, selector: &str, date: &str, amount: f64) -> Result<()> {
    // Input boundary: the ledger and calculator accept any f64, so reject
    // nonsense here, the same place a form would.
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Ledger(format!(
            "dose amount must be a non-negative number, got {}",
            amount
        )));
    }

    let dose_date = parse_date(date)?;

    let store = CompoundStore::load(&registry_path(&data_dir))?;
    let compound = store.resolve(selector)?;

    let path = ledger_path(&data_dir, compound.id);
    let mut previous = None;
    DoseLedger::update(&path, |ledger| {
        previous = ledger.upsert(dose_date, amount);
        Ok(())
    })?;

    match previous {
        Some(old) => println!(
            "✓ {} on {}: {} replaced by {}",
            compound.name, dose_date, old, amount
        ),
        None => println!("✓ {} on {}: recorded {}", compound.name, dose_date, amount),
    }

    Ok(())
}

fn cmd_series(
    data_dir: PathBuf,
    selector: &str,
    horizon: Option<i64>,
    end: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let store = CompoundStore::load(&registry_path(&data_dir))?;
    let compound = store.resolve(selector)?;

    let end_date = match end {
        Some(s) => parse_date(s)?,
        None => {
            let days = horizon.unwrap_or(config.forecast.default_horizon_days);
            config.forecast.validate_horizon(days)?;
            today() + chrono::Duration::days(days)
        }
    };

    let ledger = DoseLedger::load(&ledger_path(&data_dir, compound.id))?;
    let rows = compute_series(
        compound.start_date,
        compound.half_life_days,
        &ledger.doses(),
        end_date,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!(
            "No days to show: start date {} is after end date {}.",
            compound.start_date, end_date
        );
        return Ok(());
    }

    display_series(compound, &rows, config.display.decimals);
    Ok(())
}

fn display_series(compound: &Compound, rows: &[CalculatedDoseRow], decimals: usize) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", compound.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  t½ {} days · {} → {} ({} days)",
        compound.half_life_days,
        rows[0].date,
        rows[rows.len() - 1].date,
        rows.len()
    );
    println!();

    const BAR_WIDTH: f64 = 40.0;
    let max_active = rows.iter().fold(0.0_f64, |m, r| m.max(r.active_dose));

    println!(
        "  {:>5}  {:<10}  {:>10}  {:>10}  {:>10}",
        "day", "date", "added", "active", "next"
    );

    for row in rows {
        let bar = if max_active > 0.0 && row.active_dose > 0.0 {
            let width = ((row.active_dose / max_active) * BAR_WIDTH).round() as usize;
            "█".repeat(width)
        } else {
            String::new()
        };

        println!(
            "  {:>5}  {:<10}  {:>10}  {:>10}  {:>10}  {}",
            row.index,
            row.date.to_string(),
            format!("{:.*}", decimals, row.added_dose),
            format!("{:.*}", decimals, row.active_dose),
            format!("{:.*}", decimals, row.calculated_next),
            bar
        );
    }

    println!();
}

fn cmd_log(
    data_dir: PathBuf,
    category: &str,
    exercise: &str,
    date: Option<&str>,
    stats: Option<String>,
    notes: Option<String>,
    config: &Config,
) -> Result<()> {
    let category = ExerciseCategory::parse(category).ok_or_else(|| {
        Error::Journal(format!(
            "unknown category '{}' (expected lifting or cardio)",
            category
        ))
    })?;

    let exercise_date = match date {
        Some(s) => parse_date(s)?,
        None => today(),
    };

    let catalog = Catalog::with_custom(config);
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Exercise catalog problems:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    // Unknown exercises are allowed, but point out likely typos.
    if catalog.find(exercise).is_none() {
        eprintln!(
            "Note: '{}' is not in the exercise catalog. Logging anyway.",
            exercise
        );
    }

    let entry = ExerciseEntry {
        id: uuid::Uuid::new_v4(),
        exercise_date,
        category,
        exercise: exercise.trim().to_string(),
        stats,
        notes,
        created_at: chrono::Utc::now(),
    };

    let mut sink = JsonlSink::new(wal_path(&data_dir));
    sink.append(&entry)?;

    println!("✓ Logged {} · {} on {}", category, entry.exercise, exercise_date);
    Ok(())
}

fn cmd_day(data_dir: PathBuf, date: &str) -> Result<()> {
    let date = parse_date(date)?;
    let entries = load_entries(&wal_path(&data_dir), &csv_path(&data_dir), date, date)?;
    let summary = day_summary(&entries, date);

    println!("\n{}", date);
    if summary.entries.is_empty() {
        println!("  (rest day, no entries)");
        return Ok(());
    }

    for entry in &summary.entries {
        let marker = match entry.category {
            ExerciseCategory::Lifting => "L",
            ExerciseCategory::Cardio => "C",
        };
        print!("  [{}] {}", marker, entry.exercise);
        if let Some(ref stats) = entry.stats {
            print!("  ({})", stats);
        }
        println!();
        if let Some(ref notes) = entry.notes {
            println!("      {}", notes);
        }
    }

    Ok(())
}

fn cmd_month(data_dir: PathBuf, year: i32, month: u32) -> Result<()> {
    let (first, last) = taper_core::calendar::month_bounds(year, month)
        .ok_or_else(|| Error::Other(format!("invalid month {}-{}", year, month)))?;

    let entries = load_entries(&wal_path(&data_dir), &csv_path(&data_dir), first, last)?;
    let summaries = month_summaries(&entries, year, month)
        .ok_or_else(|| Error::Other(format!("invalid month {}-{}", year, month)))?;

    println!("\n{}-{:02}", year, month);
    for summary in &summaries {
        let lifting = if summary.has_lifting { "L" } else { "·" };
        let cardio = if summary.has_cardio { "C" } else { "·" };
        println!(
            "  {}  {} {}  {}",
            summary.date,
            lifting,
            cardio,
            if summary.entries.is_empty() {
                String::new()
            } else {
                format!("{} entries", summary.entries.len())
            }
        );
    }

    Ok(())
}

fn cmd_stats(data_dir: PathBuf, year: i32) -> Result<()> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| Error::Other(format!("invalid year {}", year)))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| Error::Other(format!("invalid year {}", year)))?;

    let entries = load_entries(&wal_path(&data_dir), &csv_path(&data_dir), first, last)?;
    let stats = year_stats(&entries, year);

    println!("\n{} stats", year);
    println!("  Lifting entries: {}", stats.lifting_count);
    println!("  Cardio entries:  {}", stats.cardio_count);
    println!("  Active days:     {}", stats.per_day.len());

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let wal_dir = data_dir.join("wal");
    let wal_path = wal_path(&data_dir);
    let csv_path = csv_path(&data_dir);

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = taper_core::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} entries to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = taper_core::csv_rollup::cleanup_processed_wals(&wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn prompt_confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
