pub mod bootstrap;
pub mod completions;
pub mod extract;
pub mod update;

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, Utc};
use std::path::Path;
use tally_core::model::Issue;
use tally_core::normalize::normalize_issues;
use tally_core::timing;

use crate::files;

/// `--today` if given, else the current UTC date.
pub fn resolve_today(flag: Option<NaiveDate>) -> NaiveDate {
    flag.unwrap_or_else(|| Utc::now().date_naive())
}

/// Read and normalize an issue list.
pub fn load_issues(path: &Path) -> Result<Vec<Issue>> {
    let raw = timing::timed("load.read_issues", || files::read_issues(path))?;
    let issues = timing::timed("load.normalize", || normalize_issues(raw))
        .with_context(|| format!("normalizing {}", path.display()))?;
    Ok(issues)
}
