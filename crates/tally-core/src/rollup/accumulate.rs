//! Day-by-day accumulation of per-area rollups over a date range.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::daily::{DayNumber, IssueProfile, day_number, window};
use crate::areas::AreaIndex;
use crate::config::RollupConfig;
use crate::model::{AreaSnapshotRollup, Issue, RollupRecord};
use crate::normalize::earliest_created;

/// Format used for the `date` field of persisted records.
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Issues pre-digested for repeated day evaluation.
///
/// Building the accumulator resolves every issue's calendar days and target
/// rows once; [`SnapshotAccumulator::run`] then only compares integers.
#[derive(Debug, Clone)]
pub struct SnapshotAccumulator {
    index: AreaIndex,
    profiles: Vec<IssueProfile>,
    window_days: DayNumber,
}

impl SnapshotAccumulator {
    /// Index the areas present in `issues` and profile every issue.
    #[must_use]
    pub fn new(issues: &[Issue], config: &RollupConfig) -> Self {
        let index = AreaIndex::from_issues(issues, &config.all_areas_label);
        Self::with_index(issues, index, config)
    }

    #[must_use]
    pub fn with_index(issues: &[Issue], index: AreaIndex, config: &RollupConfig) -> Self {
        let profiles = issues
            .iter()
            .map(|issue| IssueProfile::new(issue, &index, config))
            .collect();
        Self {
            index,
            profiles,
            window_days: window(config),
        }
    }

    #[must_use]
    pub const fn index(&self) -> &AreaIndex {
        &self.index
    }

    /// Counter rows for one day, in [`AreaIndex::labels`] order.
    #[must_use]
    pub fn rows_for(&self, day: NaiveDate) -> Vec<AreaSnapshotRollup> {
        let mut rows = vec![AreaSnapshotRollup::default(); self.index.len()];
        let day = day_number(day);
        for profile in &self.profiles {
            profile.accumulate(day, self.window_days, &mut rows);
        }
        rows
    }

    /// One record per (day, area) for every day in `[start, end]`.
    ///
    /// Records are ordered by day, then area. `start > end` yields nothing.
    #[must_use]
    pub fn run(&self, start: NaiveDate, end: NaiveDate) -> Vec<RollupRecord> {
        if start > end {
            return Vec::new();
        }

        let days = usize::try_from((end - start).num_days() + 1).unwrap_or_default();
        let mut records = Vec::with_capacity(days.saturating_mul(self.index.len()));

        for day in start.iter_days().take_while(|day| *day <= end) {
            let date = day.format(SNAPSHOT_DATE_FORMAT).to_string();
            let rows = self.rows_for(day);
            records.extend(self.index.labels().iter().zip(rows).map(|(area, counts)| {
                RollupRecord {
                    date: date.clone(),
                    area: area.clone(),
                    counts,
                }
            }));
            debug!(%date, areas = self.index.len(), "processed snapshot");
        }

        info!(
            %start,
            %end,
            days,
            issues = self.profiles.len(),
            records = records.len(),
            "accumulated snapshot range"
        );
        records
    }
}

/// Accumulate `issues` over `[start, end]`.
#[must_use]
pub fn accumulate(
    issues: &[Issue],
    start: NaiveDate,
    end: NaiveDate,
    config: &RollupConfig,
) -> Vec<RollupRecord> {
    SnapshotAccumulator::new(issues, config).run(start, end)
}

/// Full history: from the earliest creation day through `today`.
///
/// An empty issue list produces an empty series.
#[must_use]
pub fn bootstrap(issues: &[Issue], today: NaiveDate, config: &RollupConfig) -> Vec<RollupRecord> {
    let Some(earliest) = earliest_created(issues) else {
        info!("no issues; snapshot history is empty");
        return Vec::new();
    };
    accumulate(issues, earliest.date_naive(), today, config)
}
