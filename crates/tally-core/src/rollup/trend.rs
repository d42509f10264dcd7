//! Trailing monthly opened/closed counts per area.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::areas::{areas_to_update, unique_areas};
use crate::model::Issue;

/// Opened/closed totals for one area in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTrendEntry {
    /// `YYYY-MM`.
    pub month: String,
    pub area: String,
    pub opened: u64,
    pub closed: u64,
}

/// Months since year 0, so adjacent months differ by one.
fn month_index(day: NaiveDate) -> i64 {
    i64::from(day.year()) * 12 + i64::from(day.month0())
}

fn month_label(index: i64) -> String {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) + 1;
    format!("{year:04}-{month:02}")
}

/// Counts for the `months` calendar months ending with the month of `today`.
///
/// Every (month, area) pair is present, zero-filled, ordered by month and
/// then area. Issues created or closed outside the window are ignored.
#[must_use]
pub fn monthly_trend(
    issues: &[Issue],
    today: NaiveDate,
    months: u32,
    all_label: &str,
) -> Vec<MonthlyTrendEntry> {
    if months == 0 {
        return Vec::new();
    }

    let last = month_index(today);
    let first = last - i64::from(months) + 1;
    let areas = unique_areas(issues, all_label);

    let mut counts: BTreeMap<(i64, &str), (u64, u64)> = BTreeMap::new();
    for index in first..=last {
        for area in &areas {
            counts.insert((index, area.as_str()), (0, 0));
        }
    }

    for issue in issues {
        let targets = areas_to_update(issue, all_label);
        let opened = month_index(issue.created_day());
        let closed = issue.closed_day().map(month_index);

        for &area in &targets {
            if let Some(entry) = counts.get_mut(&(opened, area)) {
                entry.0 += 1;
            }
            if let Some(entry) = closed.and_then(|month| counts.get_mut(&(month, area))) {
                entry.1 += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|((index, area), (opened, closed))| MonthlyTrendEntry {
            month: month_label(index),
            area: area.to_string(),
            opened,
            closed,
        })
        .collect()
}
