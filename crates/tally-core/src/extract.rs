//! Shapes returned by the `gh` CLI and the join that turns them into
//! [`RawIssue`] records.
//!
//! The tracker is queried four times (base fields, labels, reactions and
//! REST comment counts). Each payload is keyed by issue number; the base
//! list decides which issues exist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::LabelConfig;
use crate::error::{Result, TallyError};
use crate::model::{IssueState, NO_PRIORITY, RawIssue};

/// Fields requested for the base `gh issue list` call.
pub const BASE_FIELDS: &str = "number,title,author,state,createdAt,closedAt,url,milestone";
pub const LABEL_FIELDS: &str = "number,labels";
pub const REACTION_FIELDS: &str = "number,reactionGroups";
/// `jq` filter for the paginated REST call; drops pull requests.
pub const COMMENTS_FILTER: &str = "[.[] | select(.pull_request | not) | {number, comments}]";

pub const BOTH_TYPES: &str = "Both Bug and Feature";
pub const BUG_TYPE: &str = "Bug";
pub const FEATURE_TYPE: &str = "Feature Request";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub author: Option<Author>,
    pub state: IssueState,
    pub created_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    pub url: String,
    #[serde(default)]
    pub milestone: Option<Milestone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueLabels {
    pub number: u64,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUsers {
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionGroup {
    #[serde(default)]
    pub users: Option<ReactionUsers>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReactions {
    pub number: u64,
    #[serde(default)]
    pub reaction_groups: Vec<ReactionGroup>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IssueComments {
    pub number: u64,
    #[serde(default)]
    pub comments: u64,
}

/// Everything fetched for one repository.
#[derive(Debug, Clone, Default)]
pub struct Payloads {
    pub base: Vec<BaseIssue>,
    pub labels: Vec<IssueLabels>,
    pub reactions: Vec<IssueReactions>,
    pub comments: Vec<IssueComments>,
}

/// An extracted issue as written to `<owner>-<repo>-all-issues.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIssue {
    #[serde(flatten)]
    pub issue: RawIssue,
    pub has_area: bool,
    pub has_type: bool,
}

impl From<RawIssue> for ExtractedIssue {
    fn from(issue: RawIssue) -> Self {
        Self {
            has_area: !issue.areas.is_empty(),
            has_type: issue.issue_type.is_some(),
            issue,
        }
    }
}

/// Decode a single JSON document.
///
/// # Errors
///
/// Returns [`TallyError::FetchParse`] naming `command`.
pub fn parse_payload<T: for<'de> Deserialize<'de>>(command: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| TallyError::FetchParse {
        command: command.to_string(),
        source,
    })
}

/// Decode `gh api --paginate` output: one JSON array per page, back to back.
///
/// # Errors
///
/// Returns [`TallyError::FetchParse`] on the first page that does not parse.
pub fn parse_pages<T: for<'de> Deserialize<'de>>(command: &str, bytes: &[u8]) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut pages = 0_usize;
    for page in serde_json::Deserializer::from_slice(bytes).into_iter::<Vec<T>>() {
        let page = page.map_err(|source| TallyError::FetchParse {
            command: command.to_string(),
            source,
        })?;
        pages += 1;
        items.extend(page);
    }
    debug!(command, pages, items = items.len(), "decoded paginated output");
    Ok(items)
}

/// Areas, priority and type derived from an issue's label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFacts {
    pub areas: Vec<String>,
    pub priority: i64,
    pub issue_type: Option<String>,
}

#[must_use]
pub fn classify_labels(names: &[&str], config: &LabelConfig) -> LabelFacts {
    let areas = names
        .iter()
        .filter_map(|name| name.strip_prefix(config.area_prefix.as_str()))
        .map(str::to_string)
        .collect();

    let priority = names
        .iter()
        .find_map(|name| name.strip_prefix(config.priority_prefix.as_str()))
        .and_then(|rest| rest.trim().parse().ok())
        .unwrap_or(NO_PRIORITY);

    let is_bug = names.contains(&config.bug_label.as_str());
    let is_feature = names.contains(&config.feature_label.as_str());
    let issue_type = match (is_bug, is_feature) {
        (true, true) => Some(BOTH_TYPES),
        (true, false) => Some(BUG_TYPE),
        (false, true) => Some(FEATURE_TYPE),
        (false, false) => None,
    };

    LabelFacts {
        areas,
        priority,
        issue_type: issue_type.map(str::to_string),
    }
}

/// Join the four payloads by issue number.
///
/// Issues missing from the label, reaction or comment payloads get empty
/// labels and zero counts.
#[must_use]
pub fn join(payloads: Payloads, config: &LabelConfig) -> Vec<RawIssue> {
    let labels: HashMap<u64, Vec<Label>> = payloads
        .labels
        .into_iter()
        .map(|entry| (entry.number, entry.labels))
        .collect();
    let reactions: HashMap<u64, u64> = payloads
        .reactions
        .into_iter()
        .map(|entry| {
            let total = entry
                .reaction_groups
                .iter()
                .filter_map(|group| group.users.as_ref())
                .map(|users| users.total_count)
                .sum();
            (entry.number, total)
        })
        .collect();
    let comments: HashMap<u64, u64> = payloads
        .comments
        .into_iter()
        .map(|entry| (entry.number, entry.comments))
        .collect();

    let mut unmatched_comments = 0_usize;
    let issues: Vec<RawIssue> = payloads
        .base
        .into_iter()
        .map(|base| {
            let names: Vec<&str> = labels
                .get(&base.number)
                .map(|labels| labels.iter().map(|label| label.name.as_str()).collect())
                .unwrap_or_default();
            let facts = classify_labels(&names, config);
            let comment_count = comments.get(&base.number).copied().unwrap_or_else(|| {
                unmatched_comments += 1;
                0
            });

            RawIssue {
                author: base.author.map(|author| author.login).unwrap_or_default(),
                closed_at: base.closed_at.filter(|at| !at.is_empty()),
                created_at: base.created_at,
                number: base.number,
                state: base.state,
                url: base.url,
                title: base.title,
                areas: facts.areas,
                priority: facts.priority,
                issue_type: facts.issue_type,
                total_reactions: reactions.get(&base.number).copied().unwrap_or_default(),
                comment_count,
                milestone: base.milestone.map(|milestone| milestone.title),
            }
        })
        .collect();

    if unmatched_comments > 0 {
        warn!(
            unmatched_comments,
            "issues missing from the comments listing; counted as zero"
        );
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> LabelFacts {
        classify_labels(names, &LabelConfig::default())
    }

    #[test]
    fn area_labels_lose_their_prefix() {
        let facts = labels(&["Area - UI", "Area - Backend", "Bug", "Pri: 2"]);
        assert_eq!(facts.areas, ["UI", "Backend"]);
        assert_eq!(facts.priority, 2);
        assert_eq!(facts.issue_type.as_deref(), Some("Bug"));
    }

    #[test]
    fn priority_falls_back_when_absent_or_garbage() {
        assert_eq!(labels(&[]).priority, NO_PRIORITY);
        assert_eq!(labels(&["Pri: high"]).priority, NO_PRIORITY);
        assert_eq!(labels(&["Pri:1"]).priority, 1);
        // First priority label wins.
        assert_eq!(labels(&["Pri: 3", "Pri: 0"]).priority, 3);
    }

    #[test]
    fn type_combinations() {
        assert_eq!(labels(&["Enhancement"]).issue_type.as_deref(), Some(FEATURE_TYPE));
        assert_eq!(
            labels(&["Bug", "Enhancement"]).issue_type.as_deref(),
            Some(BOTH_TYPES)
        );
        assert_eq!(labels(&["Question"]).issue_type, None);
    }

    #[test]
    fn paginated_arrays_are_concatenated() {
        let out = br#"[{"number":1,"comments":2}]
[{"number":2,"comments":0},{"number":3}]"#;
        let items: Vec<IssueComments> = parse_pages("gh api", out).expect("pages");
        let numbers: Vec<(u64, u64)> = items.iter().map(|c| (c.number, c.comments)).collect();
        assert_eq!(numbers, [(1, 2), (2, 0), (3, 0)]);
    }

    #[test]
    fn bad_page_is_a_fetch_parse_error() {
        let err = parse_pages::<IssueComments>("gh api", b"[{\"number\":1}] {oops").expect_err("bad");
        assert!(matches!(err, TallyError::FetchParse { .. }));
    }

    #[test]
    fn join_merges_by_number_and_defaults_missing() {
        let base: Vec<BaseIssue> = serde_json::from_str(
            r#"[
                {"number":1,"title":"A","author":{"login":"alice"},"state":"OPEN",
                 "createdAt":"2024-01-01T00:00:00Z","closedAt":null,"url":"u1",
                 "milestone":{"title":"Backlog"}},
                {"number":2,"title":"B","author":{"login":"bob"},"state":"CLOSED",
                 "createdAt":"2024-01-02T00:00:00Z","closedAt":"2024-01-03T00:00:00Z","url":"u2",
                 "milestone":null}
            ]"#,
        )
        .expect("base");
        let payloads = Payloads {
            base,
            labels: vec![IssueLabels {
                number: 1,
                labels: vec![Label { name: "Area - UI".into() }],
            }],
            reactions: serde_json::from_str(
                r#"[{"number":1,"reactionGroups":[{"users":{"totalCount":3}},{"users":{"totalCount":2}},{}]}]"#,
            )
            .expect("reactions"),
            comments: vec![IssueComments { number: 2, comments: 7 }],
        };

        let issues = join(payloads, &LabelConfig::default());
        assert_eq!(issues.len(), 2);

        assert_eq!(issues[0].author, "alice");
        assert_eq!(issues[0].areas, ["UI"]);
        assert_eq!(issues[0].total_reactions, 5);
        assert_eq!(issues[0].comment_count, 0);
        assert_eq!(issues[0].milestone.as_deref(), Some("Backlog"));

        assert_eq!(issues[1].state, IssueState::Closed);
        assert!(issues[1].areas.is_empty());
        assert_eq!(issues[1].comment_count, 7);
        assert_eq!(issues[1].closed_at.as_deref(), Some("2024-01-03T00:00:00Z"));
    }

    #[test]
    fn extracted_issue_round_trips_through_raw_reader() {
        let raw = RawIssue {
            author: "a".into(),
            closed_at: None,
            created_at: "2024-01-01T00:00:00Z".into(),
            number: 4,
            state: IssueState::Open,
            url: "u".into(),
            title: "t".into(),
            areas: vec!["UI".into()],
            priority: NO_PRIORITY,
            issue_type: None,
            total_reactions: 0,
            comment_count: 0,
            milestone: None,
        };
        let json = serde_json::to_value(ExtractedIssue::from(raw.clone())).expect("ser");
        assert_eq!(json["hasArea"], true);
        assert_eq!(json["hasType"], false);
        let back: RawIssue = serde_json::from_value(json).expect("raw reader ignores extras");
        assert_eq!(back, raw);
    }
}
