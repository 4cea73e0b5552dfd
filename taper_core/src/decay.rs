//! Dose-decay series calculator.
//!
//! Given a compound's half-life and its sparse dose ledger, this module
//! computes a dense daily series of the active amount remaining in the body,
//! including forward projection to an arbitrary end date.
//!
//! ## Recurrence
//!
//! Walking the window one calendar day at a time, starting from zero:
//!
//! 1. add the day's administered dose (if any) to the carry-over,
//! 2. decay the post-add amount by one day: `x * 0.5^(1 / half_life_days)`,
//! 3. carry the decayed value into the next day.
//!
//! The carry-over starts at zero on the first day of the window, so a dose
//! recorded before the window's start date has no effect on any emitted row.
//! That is intentional: decay state is not reconstructed from history.

use crate::types::{CalculatedDoseRow, Dose};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Compute the daily decay series for one compound.
///
/// Emits one row per calendar day from `start_date` through `end_date`
/// inclusive, in ascending date order with a 1-based `index`. Returns an
/// empty vector when `start_date > end_date`.
///
/// `half_life_days` must be positive; callers validate this before a
/// compound is persisted, and this function does not re-check it. Doses
/// dated outside the window are simply never visited. If `doses` carries
/// duplicate dates the last entry wins, though the ledger's upsert
/// discipline normally rules that out.
///
/// Pure and deterministic: no I/O, inputs are not mutated, and identical
/// inputs produce bit-identical rows. All arithmetic is plain f64 with no
/// rounding; formatting for display is the consumer's concern.
pub fn compute_series(
    start_date: NaiveDate,
    half_life_days: f64,
    doses: &[Dose],
    end_date: NaiveDate,
) -> Vec<CalculatedDoseRow> {
    if start_date > end_date {
        return Vec::new();
    }

    let dose_map: HashMap<NaiveDate, f64> = doses
        .iter()
        .map(|d| (d.dose_date, d.dose_amount))
        .collect();

    let day_count = (end_date - start_date).num_days() as usize + 1;
    let mut rows = Vec::with_capacity(day_count);
    let mut active_dose = 0.0_f64;

    for (i, day) in start_date
        .iter_days()
        .take_while(|day| *day <= end_date)
        .enumerate()
    {
        let added_dose = dose_map.get(&day).copied().unwrap_or(0.0);

        // Today's dose lands on yesterday's already-decayed carry-over.
        active_dose += added_dose;

        // One day of single-exponential decay, applied post-add.
        let calculated_next = active_dose * 0.5_f64.powf(1.0 / half_life_days);

        rows.push(CalculatedDoseRow {
            date: day,
            index: i + 1,
            active_dose,
            calculated_next,
            added_dose,
        });

        active_dose = calculated_next;
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dose(y: i32, m: u32, d: u32, amount: f64) -> Dose {
        Dose {
            dose_date: date(y, m, d),
            dose_amount: amount,
        }
    }

    #[test]
    fn test_no_doses_yields_all_zero_rows() {
        let rows = compute_series(date(2026, 1, 1), 3.5, &[], date(2026, 1, 10));

        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert_eq!(row.added_dose, 0.0);
            assert_eq!(row.active_dose, 0.0);
            assert_eq!(row.calculated_next, 0.0);
        }
    }

    #[test]
    fn test_single_dose_halving_curve() {
        // Half-life of exactly one day halves the amount every step, and
        // powers of two are exact in f64, so these compare with ==.
        let doses = [dose(2026, 1, 1, 100.0)];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 4));

        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].added_dose, 100.0);
        assert_eq!(rows[0].active_dose, 100.0);
        assert_eq!(rows[0].calculated_next, 50.0);

        assert_eq!(rows[1].added_dose, 0.0);
        assert_eq!(rows[1].active_dose, 50.0);
        assert_eq!(rows[1].calculated_next, 25.0);

        assert_eq!(rows[2].active_dose, 25.0);
        assert_eq!(rows[2].calculated_next, 12.5);

        assert_eq!(rows[3].active_dose, 12.5);
        assert_eq!(rows[3].calculated_next, 6.25);
    }

    #[test]
    fn test_rows_are_dense_ascending_and_one_indexed() {
        let rows = compute_series(date(2026, 2, 27), 2.0, &[], date(2026, 3, 2));

        // Window crosses a (leap year) month boundary.
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, date(2026, 2, 27));
        assert_eq!(rows[1].date, date(2026, 2, 28));
        assert_eq!(rows[2].date, date(2026, 3, 1));
        assert_eq!(rows[3].date, date(2026, 3, 2));

        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.index, i + 1);
        }
    }

    #[test]
    fn test_redose_adds_to_decayed_carry_over() {
        let doses = [dose(2026, 1, 1, 100.0), dose(2026, 1, 2, 50.0)];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 2));

        // Day 2: 50 carried in from day 1 plus the new 50.
        assert_eq!(rows[1].added_dose, 50.0);
        assert_eq!(rows[1].active_dose, 100.0);
        assert_eq!(rows[1].calculated_next, 50.0);
    }

    #[test]
    fn test_start_after_end_is_empty() {
        let doses = [dose(2026, 1, 1, 100.0)];
        let rows = compute_series(date(2026, 1, 2), 1.0, &doses, date(2026, 1, 1));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_single_day_window() {
        let doses = [dose(2026, 1, 1, 75.0)];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 1));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].active_dose, 75.0);
        assert_eq!(rows[0].calculated_next, 37.5);
    }

    #[test]
    fn test_out_of_window_doses_are_ignored() {
        let doses = [
            dose(2025, 12, 20, 500.0), // before the window
            dose(2026, 1, 2, 40.0),
            dose(2026, 2, 1, 500.0), // after the window
        ];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 4));

        // Only the in-window dose contributes anything.
        assert_eq!(rows[0].active_dose, 0.0);
        assert_eq!(rows[1].active_dose, 40.0);
        assert_eq!(rows[2].active_dose, 20.0);
        assert_eq!(rows[3].active_dose, 10.0);
    }

    #[test]
    fn test_duplicate_dates_last_entry_wins() {
        let doses = [dose(2026, 1, 1, 30.0), dose(2026, 1, 1, 50.0)];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 1));

        assert_eq!(rows[0].added_dose, 50.0);
        assert_eq!(rows[0].active_dose, 50.0);
    }

    #[test]
    fn test_fractional_half_life() {
        // Half-life of 2 days decays by 1/sqrt(2) per day.
        let doses = [dose(2026, 1, 1, 100.0)];
        let rows = compute_series(date(2026, 1, 1), 2.0, &doses, date(2026, 1, 3));

        let factor = 0.5_f64.powf(0.5);
        assert_relative_eq!(rows[0].calculated_next, 100.0 * factor, epsilon = 1e-12);
        assert_relative_eq!(rows[1].active_dose, 100.0 * factor, epsilon = 1e-12);
        assert_relative_eq!(rows[2].active_dose, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_amount_passes_through_arithmetically() {
        // The calculator imposes no floor; input validation lives upstream.
        let doses = [dose(2026, 1, 1, -10.0)];
        let rows = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 2));

        assert_eq!(rows[0].active_dose, -10.0);
        assert_eq!(rows[1].active_dose, -5.0);
    }

    #[test]
    fn test_determinism_bit_identical_output() {
        let doses = [
            dose(2026, 1, 3, 12.34),
            dose(2026, 1, 9, 56.78),
            dose(2026, 1, 17, 9.01),
        ];
        let a = compute_series(date(2026, 1, 1), 2.7, &doses, date(2026, 3, 31));
        let b = compute_series(date(2026, 1, 1), 2.7, &doses, date(2026, 3, 31));

        assert_eq!(a, b);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let doses = [dose(2026, 1, 1, 100.0)];
        let before = doses;
        let _ = compute_series(date(2026, 1, 1), 1.0, &doses, date(2026, 1, 4));
        assert_eq!(doses, before);
    }

    #[test]
    fn test_multi_year_window_length() {
        let rows = compute_series(date(2024, 1, 1), 7.0, &[], date(2026, 12, 31));
        // 2024 is a leap year: 366 + 365 + 365 days.
        assert_eq!(rows.len(), 1096);
        assert_eq!(rows.last().unwrap().index, 1096);
    }
}
