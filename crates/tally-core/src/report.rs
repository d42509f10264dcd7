//! The combined report document written by `bootstrap` and `update`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ProjectConfig;
use crate::error::{Result, TallyError};
use crate::model::{Issue, RollupRecord};
use crate::rollup::{MonthlyTrendEntry, monthly_trend};
use crate::select::{self, IssueSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    #[serde(default)]
    pub most_reacted_issues: Vec<IssueSummary>,
    #[serde(default)]
    pub most_commented_issues: Vec<IssueSummary>,
    #[serde(default)]
    pub no_area_issues: Vec<IssueSummary>,
    #[serde(default)]
    pub no_milestone_issues: Vec<IssueSummary>,
    #[serde(default)]
    pub backlog_issues: Vec<IssueSummary>,
    #[serde(default)]
    pub charts: Vec<RollupRecord>,
    #[serde(
        rename = "MonthlyTrend",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub monthly_trend: Option<Vec<MonthlyTrendEntry>>,
}

/// Only the part of a stored document incremental mode reuses.
#[derive(Debug, Deserialize)]
struct StoredCharts {
    #[serde(default)]
    charts: Vec<RollupRecord>,
}

impl ReportDocument {
    /// Regenerate every list from `issues` and attach `charts`.
    ///
    /// The monthly trend is included when `with_trend` is set.
    #[must_use]
    pub fn build(
        issues: &[Issue],
        charts: Vec<RollupRecord>,
        today: NaiveDate,
        config: &ProjectConfig,
        with_trend: bool,
    ) -> Self {
        let top_n = config.report.top_n;
        let doc = Self {
            most_reacted_issues: select::most_reacted(issues, top_n),
            most_commented_issues: select::most_commented(issues, top_n),
            no_area_issues: select::no_area(issues),
            no_milestone_issues: select::no_milestone(issues),
            backlog_issues: select::backlog(issues, &config.rollup.backlog_milestone),
            charts,
            monthly_trend: with_trend.then(|| {
                monthly_trend(
                    issues,
                    today,
                    config.report.trend_months,
                    &config.rollup.all_areas_label,
                )
            }),
        };
        info!(
            charts = doc.charts.len(),
            most_reacted = doc.most_reacted_issues.len(),
            backlog = doc.backlog_issues.len(),
            trend = doc.monthly_trend.is_some(),
            "built report document"
        );
        doc
    }
}

/// Pull `charts` out of a previously written report.
///
/// Every other field is ignored, so older or partial documents still load.
///
/// # Errors
///
/// Returns [`TallyError::MalformedInput`] when the text is not a JSON object
/// or `charts` has the wrong shape.
pub fn read_charts(text: &str) -> Result<Vec<RollupRecord>> {
    let stored: StoredCharts =
        serde_json::from_str(text).map_err(|source| TallyError::MalformedInput {
            what: "charts document".to_string(),
            source,
        })?;
    Ok(stored.charts)
}
