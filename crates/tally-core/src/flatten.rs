//! One spreadsheet row per (issue, area) pair.

use serde::Serialize;
use std::fmt::Write as _;

use crate::model::RawIssue;

pub const CSV_HEADER: [&str; 13] = [
    "Number",
    "Title",
    "Author",
    "State",
    "CreatedAt",
    "ClosedAt",
    "Area",
    "Type",
    "Reactions",
    "URL",
    "Comments",
    "Priority",
    "Milestone",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlatIssueRow {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub state: String,
    pub created_at: String,
    pub closed_at: Option<String>,
    /// Empty for issues without any area.
    pub area: String,
    #[serde(rename = "Type")]
    pub issue_type: Option<String>,
    pub reactions: u64,
    #[serde(rename = "URL")]
    pub url: String,
    pub comments: u64,
    pub priority: i64,
    pub milestone: Option<String>,
}

impl FlatIssueRow {
    fn for_area(issue: &RawIssue, area: &str) -> Self {
        Self {
            number: issue.number,
            title: issue.title.clone(),
            author: issue.author.clone(),
            state: issue.state.as_str().to_string(),
            created_at: issue.created_at.clone(),
            closed_at: issue.closed_at.clone(),
            area: area.to_string(),
            issue_type: issue.issue_type.clone(),
            reactions: issue.total_reactions,
            url: issue.url.clone(),
            comments: issue.comment_count,
            priority: issue.priority,
            milestone: issue.milestone.clone(),
        }
    }

    /// Fields in [`CSV_HEADER`] order; `None` marks a null cell.
    fn cells(&self) -> [Option<String>; 13] {
        [
            Some(self.number.to_string()),
            Some(self.title.clone()),
            Some(self.author.clone()),
            Some(self.state.clone()),
            Some(self.created_at.clone()),
            self.closed_at.clone(),
            Some(self.area.clone()),
            self.issue_type.clone(),
            Some(self.reactions.to_string()),
            Some(self.url.clone()),
            Some(self.comments.to_string()),
            Some(self.priority.to_string()),
            self.milestone.clone(),
        ]
    }
}

/// Expand issues into rows: one per area, or a single empty-area row.
#[must_use]
pub fn flatten(issues: &[RawIssue]) -> Vec<FlatIssueRow> {
    issues
        .iter()
        .flat_map(|issue| {
            if issue.areas.is_empty() {
                vec![FlatIssueRow::for_area(issue, "")]
            } else {
                issue
                    .areas
                    .iter()
                    .map(|area| FlatIssueRow::for_area(issue, area))
                    .collect()
            }
        })
        .collect()
}

fn push_cell(out: &mut String, cell: Option<&str>) {
    if let Some(value) = cell {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    }
}

/// Unquoted header, then one quoted line per row. Null cells stay empty.
#[must_use]
pub fn to_csv(rows: &[FlatIssueRow]) -> String {
    let mut out = CSV_HEADER.join(",");
    for row in rows {
        out.push('\n');
        for (i, cell) in row.cells().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_cell(&mut out, cell.as_deref());
        }
    }
    out
}

/// Summary line for logs: rows per area, most populous first.
#[must_use]
pub fn describe(rows: &[FlatIssueRow]) -> String {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for row in rows {
        *counts.entry(row.area.as_str()).or_default() += 1;
    }
    let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = String::new();
    for (i, (area, count)) in ordered.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let label = if area.is_empty() { "(none)" } else { area };
        let _ = write!(out, "{label}={count}");
    }
    out
}
