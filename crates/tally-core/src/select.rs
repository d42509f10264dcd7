//! Issue lists for the report, computed from live state only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Issue, IssueState};

/// The subset of issue fields the report lists carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
    pub state: IssueState,
    #[serde(with = "crate::model::issue::canonical")]
    pub created_at: DateTime<Utc>,
    pub areas: Vec<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub priority: i64,
    pub milestone: Option<String>,
    pub total_reactions: u64,
    pub comment_count: u64,
}

impl From<&Issue> for IssueSummary {
    fn from(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title.clone(),
            author: issue.author.clone(),
            url: issue.url.clone(),
            state: issue.state,
            created_at: issue.created_at,
            areas: issue.areas.clone(),
            issue_type: issue.issue_type.clone(),
            priority: issue.priority,
            milestone: issue.milestone.clone(),
            total_reactions: issue.total_reactions,
            comment_count: issue.comment_count,
        }
    }
}

fn top_by(issues: &[Issue], limit: usize, metric: impl Fn(&Issue) -> u64) -> Vec<IssueSummary> {
    let mut picked: Vec<&Issue> = issues
        .iter()
        .filter(|issue| issue.is_open() && metric(issue) > 0)
        .collect();
    // Stable, so ties keep input order.
    picked.sort_by(|a, b| metric(b).cmp(&metric(a)));
    picked.into_iter().take(limit).map(IssueSummary::from).collect()
}

fn open_where(issues: &[Issue], keep: impl Fn(&Issue) -> bool) -> Vec<IssueSummary> {
    issues
        .iter()
        .filter(|issue| issue.is_open() && keep(issue))
        .map(IssueSummary::from)
        .collect()
}

/// Open issues with at least one reaction, most reacted first.
#[must_use]
pub fn most_reacted(issues: &[Issue], limit: usize) -> Vec<IssueSummary> {
    top_by(issues, limit, |issue| issue.total_reactions)
}

/// Open issues with at least one comment, most commented first.
#[must_use]
pub fn most_commented(issues: &[Issue], limit: usize) -> Vec<IssueSummary> {
    top_by(issues, limit, |issue| issue.comment_count)
}

#[must_use]
pub fn no_area(issues: &[Issue]) -> Vec<IssueSummary> {
    open_where(issues, |issue| issue.areas.is_empty())
}

#[must_use]
pub fn no_milestone(issues: &[Issue]) -> Vec<IssueSummary> {
    open_where(issues, |issue| issue.milestone.is_none())
}

#[must_use]
pub fn backlog(issues: &[Issue], backlog_milestone: &str) -> Vec<IssueSummary> {
    open_where(issues, |issue| issue.has_milestone(backlog_milestone))
}
