//! Daily per-area rollups: predicates, accumulation, incremental extension
//! and monthly trend.

pub mod accumulate;
pub mod daily;
pub mod incremental;
pub mod trend;

pub use accumulate::{SNAPSHOT_DATE_FORMAT, SnapshotAccumulator, accumulate, bootstrap};
pub use daily::{DailyFacts, IssueProfile, evaluate};
pub use incremental::{Extension, MergePolicy, extend_from, extend_series, merge, plan_extension};
pub use trend::{MonthlyTrendEntry, monthly_trend};
