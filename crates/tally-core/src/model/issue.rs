use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority value used when an issue carries no priority label.
pub const NO_PRIORITY: i64 = -1;

/// Live lifecycle state as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueState {
    #[serde(rename = "OPEN", alias = "open", alias = "Open")]
    Open,
    #[serde(rename = "CLOSED", alias = "closed", alias = "Closed")]
    Closed,
}

impl IssueState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue record as it arrives from the extractor, before normalization.
///
/// Timestamps are kept as the tracker's strings; [`crate::normalize`] turns
/// them into instants and fails on anything unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub author: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    pub created_at: String,
    pub number: u64,
    pub state: IssueState,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default = "no_priority")]
    pub priority: i64,
    #[serde(rename = "type", default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub total_reactions: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub milestone: Option<String>,
}

/// A normalized issue. Timestamps are UTC instants and serialize in the
/// canonical `YYYY-MM-DDTHH:MM:SS.sssZ` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub author: String,
    #[serde(with = "canonical_opt", default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(with = "canonical")]
    pub created_at: DateTime<Utc>,
    pub number: u64,
    pub state: IssueState,
    pub url: String,
    pub title: String,
    pub areas: Vec<String>,
    pub priority: i64,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub has_area: bool,
    pub has_type: bool,
    pub total_reactions: u64,
    pub comment_count: u64,
    pub milestone: Option<String>,
}

impl Issue {
    /// UTC calendar day the issue was opened.
    #[must_use]
    pub fn created_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// UTC calendar day the issue was closed, if it has been.
    #[must_use]
    pub fn closed_day(&self) -> Option<NaiveDate> {
        self.closed_at.map(|at| at.date_naive())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    #[must_use]
    pub fn has_milestone(&self, title: &str) -> bool {
        self.milestone.as_deref() == Some(title)
    }
}

/// Render an instant the way every persisted document stores it.
#[must_use]
pub fn canonical_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

const fn no_priority() -> i64 {
    NO_PRIORITY
}

pub(crate) mod canonical {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::canonical_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

mod canonical_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(at: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match at {
            Some(at) => s.serialize_str(&super::canonical_timestamp(at)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        raw.map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(D::Error::custom)
        })
        .transpose()
    }
}
