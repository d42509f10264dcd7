//! Issue normalization: canonical UTC timestamps and derived flags.
//!
//! Every downstream computation compares calendar days derived from these
//! instants, so a timestamp that cannot be parsed aborts the run instead of
//! falling back to a default.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, TallyError};
use crate::model::{Issue, RawIssue};

/// Parse one tracker timestamp into a UTC instant.
///
/// # Errors
///
/// Returns [`TallyError::MalformedTimestamp`] naming the issue and field.
pub fn parse_timestamp(number: u64, field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| TallyError::MalformedTimestamp {
            number,
            field,
            value: value.to_string(),
            source,
        })
}

/// Normalize a single raw record.
///
/// # Errors
///
/// Fails when `createdAt` or a present `closedAt` is not RFC 3339.
pub fn normalize_issue(raw: RawIssue) -> Result<Issue> {
    let created_at = parse_timestamp(raw.number, "createdAt", &raw.created_at)?;
    let closed_at = raw
        .closed_at
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_timestamp(raw.number, "closedAt", value))
        .transpose()?;

    let has_area = !raw.areas.is_empty();
    let has_type = raw.issue_type.is_some();

    Ok(Issue {
        author: raw.author,
        closed_at,
        created_at,
        number: raw.number,
        state: raw.state,
        url: raw.url,
        title: raw.title,
        areas: raw.areas,
        priority: raw.priority,
        issue_type: raw.issue_type,
        has_area,
        has_type,
        total_reactions: raw.total_reactions,
        comment_count: raw.comment_count,
        milestone: raw.milestone,
    })
}

/// Normalize a whole batch, stopping at the first malformed record.
///
/// # Errors
///
/// See [`normalize_issue`].
pub fn normalize_issues(raw: Vec<RawIssue>) -> Result<Vec<Issue>> {
    let total = raw.len();
    let issues = raw
        .into_iter()
        .map(normalize_issue)
        .collect::<Result<Vec<_>>>()?;
    debug!(total, "normalized issue timestamps");
    Ok(issues)
}

/// Earliest creation instant across the batch; `None` when empty.
#[must_use]
pub fn earliest_created(issues: &[Issue]) -> Option<DateTime<Utc>> {
    issues.iter().map(|issue| issue.created_at).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueState, NO_PRIORITY, canonical_timestamp};

    fn raw(number: u64, created: &str, closed: Option<&str>) -> RawIssue {
        RawIssue {
            author: "octocat".into(),
            closed_at: closed.map(str::to_string),
            created_at: created.into(),
            number,
            state: if closed.is_some() {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            url: format!("https://example.test/issues/{number}"),
            title: format!("Issue {number}"),
            areas: Vec::new(),
            priority: NO_PRIORITY,
            issue_type: None,
            total_reactions: 0,
            comment_count: 0,
            milestone: None,
        }
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        let issue = normalize_issue(raw(1, "2024-01-05T23:30:00-02:00", None)).expect("ok");
        assert_eq!(canonical_timestamp(&issue.created_at), "2024-01-06T01:30:00.000Z");
        assert_eq!(issue.created_day().to_string(), "2024-01-06");
    }

    #[test]
    fn closed_at_is_normalized_when_present() {
        let issue = normalize_issue(raw(
            2,
            "2024-01-01T00:00:00Z",
            Some("2024-01-10T12:00:00.5+00:00"),
        ))
        .expect("ok");
        let closed = issue.closed_at.expect("closed");
        assert_eq!(canonical_timestamp(&closed), "2024-01-10T12:00:00.500Z");
    }

    #[test]
    fn empty_closed_at_counts_as_open() {
        let issue = normalize_issue(raw(3, "2024-01-01T00:00:00Z", Some(""))).expect("ok");
        assert!(issue.closed_at.is_none());
    }

    #[test]
    fn malformed_created_at_fails_loudly() {
        let err = normalize_issues(vec![
            raw(1, "2024-01-01T00:00:00Z", None),
            raw(42, "last tuesday", None),
        ])
        .expect_err("should fail");
        match err {
            TallyError::MalformedTimestamp {
                number,
                field,
                value,
                ..
            } => {
                assert_eq!(number, 42);
                assert_eq!(field, "createdAt");
                assert_eq!(value, "last tuesday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_closed_at_names_field() {
        let err = normalize_issue(raw(9, "2024-01-01T00:00:00Z", Some("2024-13-45")))
            .expect_err("should fail");
        assert!(err.to_string().contains("closedAt"), "{err}");
    }

    #[test]
    fn derived_flags_follow_areas_and_type() {
        let mut with_both = raw(4, "2024-01-01T00:00:00Z", None);
        with_both.areas = vec!["UI".into()];
        with_both.issue_type = Some("Bug".into());
        let issue = normalize_issue(with_both).expect("ok");
        assert!(issue.has_area);
        assert!(issue.has_type);

        let bare = normalize_issue(raw(5, "2024-01-01T00:00:00Z", None)).expect("ok");
        assert!(!bare.has_area);
        assert!(!bare.has_type);
    }

    #[test]
    fn earliest_created_picks_minimum() {
        let issues = normalize_issues(vec![
            raw(1, "2024-03-01T00:00:00Z", None),
            raw(2, "2023-12-31T23:59:59Z", None),
            raw(3, "2024-01-01T00:00:00Z", None),
        ])
        .expect("ok");
        let earliest = earliest_created(&issues).expect("non-empty");
        assert_eq!(canonical_timestamp(&earliest), "2023-12-31T23:59:59.000Z");
        assert!(earliest_created(&[]).is_none());
    }
}
