//! Extend a persisted snapshot series forward without recomputing history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::accumulate::{SNAPSHOT_DATE_FORMAT, SnapshotAccumulator};
use crate::config::RollupConfig;
use crate::error::{Result, TallyError};
use crate::model::{Issue, RollupRecord};

/// How freshly computed records are combined with the stored series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Concatenate. Re-running over a covered range duplicates
    /// (date, area) records; nothing is deduplicated.
    #[default]
    Append,
    /// Key by (date, area); new records replace stored ones and the result
    /// is sorted by key.
    Upsert,
}

impl MergePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Upsert => "upsert",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "upsert" => Ok(Self::Upsert),
            other => Err(format!("unknown merge policy '{other}' (expected append|upsert)")),
        }
    }
}

/// Outcome of planning an incremental run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// The series already covers `today`.
    UpToDate { last: NaiveDate },
    /// New records for `[from, to]`.
    Extended {
        from: NaiveDate,
        to: NaiveDate,
        records: Vec<RollupRecord>,
    },
}

impl Extension {
    #[must_use]
    pub const fn is_up_to_date(&self) -> bool {
        matches!(self, Self::UpToDate { .. })
    }

    #[must_use]
    pub fn records(&self) -> &[RollupRecord] {
        match self {
            Self::UpToDate { .. } => &[],
            Self::Extended { records, .. } => records,
        }
    }
}

/// Latest `date` in the series.
///
/// Dates are fixed-width `YYYY-MM-DD`, so the lexicographic maximum is the
/// chronological one.
#[must_use]
pub fn last_snapshot_date(series: &[RollupRecord]) -> Option<&str> {
    series.iter().map(|record| record.date.as_str()).max()
}

/// Parse a stored snapshot date.
///
/// # Errors
///
/// Returns [`TallyError::InvalidSnapshotDate`] for anything but `YYYY-MM-DD`.
pub fn parse_snapshot_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, SNAPSHOT_DATE_FORMAT).map_err(|source| {
        TallyError::InvalidSnapshotDate {
            value: value.to_string(),
            source,
        }
    })
}

/// First day not yet covered by `series`.
///
/// # Errors
///
/// [`TallyError::NoSnapshotHistory`] when the series is empty: the full
/// bootstrap has to run first. [`TallyError::InvalidSnapshotDate`] when the
/// latest stored date does not parse.
pub fn next_start(series: &[RollupRecord]) -> Result<(NaiveDate, NaiveDate)> {
    let last = last_snapshot_date(series).ok_or(TallyError::NoSnapshotHistory)?;
    let last = parse_snapshot_date(last)?;
    let next = last.succ_opt().unwrap_or(last);
    Ok((last, next))
}

/// Compute the records for `[from, today]`, or report up-to-date when
/// `from > today`.
#[must_use]
pub fn extend_from(
    issues: &[Issue],
    from: NaiveDate,
    today: NaiveDate,
    config: &RollupConfig,
) -> Extension {
    if from > today {
        let last = from.pred_opt().unwrap_or(from);
        return Extension::UpToDate { last };
    }
    let records = SnapshotAccumulator::new(issues, config).run(from, today);
    Extension::Extended {
        from,
        to: today,
        records,
    }
}

/// Plan the extension of `series` through `today`.
///
/// # Errors
///
/// See [`next_start`].
pub fn plan_extension(
    series: &[RollupRecord],
    issues: &[Issue],
    today: NaiveDate,
    config: &RollupConfig,
) -> Result<Extension> {
    let (last, next) = next_start(series)?;
    info!(%last, %next, %today, "planning incremental update");
    if next > today {
        info!("charts are already up to date");
        return Ok(Extension::UpToDate { last });
    }
    Ok(extend_from(issues, next, today, config))
}

/// Combine the stored series with newly computed records.
#[must_use]
pub fn merge(
    existing: Vec<RollupRecord>,
    added: Vec<RollupRecord>,
    policy: MergePolicy,
) -> Vec<RollupRecord> {
    match policy {
        MergePolicy::Append => {
            let mut merged = existing;
            merged.extend(added);
            merged
        }
        MergePolicy::Upsert => {
            let before = existing.len() + added.len();
            let mut keyed: BTreeMap<(String, String), RollupRecord> = BTreeMap::new();
            for record in existing.into_iter().chain(added) {
                keyed.insert((record.date.clone(), record.area.clone()), record);
            }
            let replaced = before - keyed.len();
            if replaced > 0 {
                warn!(replaced, "upsert replaced existing (date, area) records");
            }
            keyed.into_values().collect()
        }
    }
}

/// Plan, compute and merge in one step.
///
/// Returns the merged series and the extension outcome. When up to date,
/// the series is returned unchanged.
///
/// # Errors
///
/// See [`next_start`].
pub fn extend_series(
    series: Vec<RollupRecord>,
    issues: &[Issue],
    today: NaiveDate,
    config: &RollupConfig,
    policy: MergePolicy,
) -> Result<(Vec<RollupRecord>, Extension)> {
    let extension = plan_extension(&series, issues, today, config)?;
    if extension.is_up_to_date() {
        return Ok((series, extension));
    }
    let merged = merge(series, extension.records().to_vec(), policy);
    info!(
        added = extension.records().len(),
        total = merged.len(),
        %policy,
        "merged snapshot series"
    );
    Ok((merged, extension))
}
