//! Trailing monthly payment totals for the dashboard chart

use chrono::{Datelike, NaiveDate};

use crate::models::{MonthlyTotal, Payment};

/// Longest window a caller may ask for (ten years)
pub const MAX_HISTORY_MONTHS: u32 = 120;

/// Sum payments per calendar month for the `months` months ending with the
/// month of `today`, oldest first. Months are keyed by year and month so
/// payments from the same month of an earlier year are not counted.
pub fn monthly_payment_history(
    payments: &[Payment],
    today: NaiveDate,
    months: u32,
) -> Vec<MonthlyTotal> {
    let current = month_index(today.year(), today.month());

    (0..months as i64)
        .rev()
        .map(|back| {
            let index = current - back;
            let year = index.div_euclid(12) as i32;
            let month = index.rem_euclid(12) as u32 + 1;

            let total = payments
                .iter()
                .filter(|p| p.date.year() == year && p.date.month() == month)
                .map(|p| p.amount)
                .sum();

            MonthlyTotal {
                year,
                month,
                label: month_label(year, month),
                total,
            }
        })
        .collect()
}

fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b").to_string())
        .unwrap_or_default()
}
