//! Domain records: issues in and rollup records out.

pub mod issue;
pub mod rollup;

pub use issue::{Issue, IssueState, NO_PRIORITY, RawIssue, canonical_timestamp};
pub use rollup::{AgeBucket, AreaSnapshotRollup, RollupRecord};
