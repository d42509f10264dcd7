use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for script-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfig,
    InputNotFound,
    ChartsNotFound,
    NoSnapshotHistory,
    MalformedTimestamp,
    InvalidSnapshotDate,
    MalformedInput,
    FetchFailed,
    FetchParseFailed,
    OutputWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfig => "E1002",
            Self::InputNotFound => "E2001",
            Self::ChartsNotFound => "E2002",
            Self::NoSnapshotHistory => "E2003",
            Self::MalformedTimestamp => "E3001",
            Self::InvalidSnapshotDate => "E3002",
            Self::MalformedInput => "E3003",
            Self::FetchFailed => "E4001",
            Self::FetchParseFailed => "E4002",
            Self::OutputWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfig => "Invalid configuration value",
            Self::InputNotFound => "Input file not found",
            Self::ChartsNotFound => "Charts file not found",
            Self::NoSnapshotHistory => "No existing snapshot history",
            Self::MalformedTimestamp => "Malformed issue timestamp",
            Self::InvalidSnapshotDate => "Invalid snapshot date in charts",
            Self::MalformedInput => "Malformed input document",
            Self::FetchFailed => "Issue tracker command failed",
            Self::FetchParseFailed => "Issue tracker output could not be parsed",
            Self::OutputWriteFailed => "Output file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .tally/config.toml and retry."),
            Self::InvalidConfig => Some("Check the documented ranges for [rollup] and [report]."),
            Self::InputNotFound => Some("Run `tally extract <owner/repo>` to produce an issues file."),
            Self::ChartsNotFound | Self::NoSnapshotHistory => {
                Some("Run `tally bootstrap` first to build the full snapshot history.")
            }
            Self::MalformedTimestamp => {
                Some("Timestamps must be RFC 3339, e.g. 2024-01-05T10:00:00Z.")
            }
            Self::InvalidSnapshotDate => {
                Some("Charts dates must be YYYY-MM-DD; rebuild the file with `tally bootstrap`.")
            }
            Self::MalformedInput => None,
            Self::FetchFailed => Some("Check that `gh` is installed and `gh auth status` succeeds."),
            Self::FetchParseFailed => Some("Upgrade `gh` and retry; its JSON output changed."),
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `tally update` finishes."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the rollup pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("failed to parse config {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("charts file not found: {}", .0.display())]
    ChartsNotFound(PathBuf),

    #[error("no existing snapshot data found in charts; run bootstrap first")]
    NoSnapshotHistory,

    #[error("issue #{number}: malformed {field} timestamp '{value}': {source}")]
    MalformedTimestamp {
        number: u64,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid snapshot date '{value}' in charts")]
    InvalidSnapshotDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed {what}: {source}")]
    MalformedInput {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    FetchFailed { command: String, stderr: String },

    #[error("could not parse output of `{command}`: {source}")]
    FetchParse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("charts lock at {} timed out after {waited_ms}ms", .path.display())]
    LockTimeout { path: PathBuf, waited_ms: u128 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TallyError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::InputNotFound(_) => ErrorCode::InputNotFound,
            Self::ChartsNotFound(_) => ErrorCode::ChartsNotFound,
            Self::NoSnapshotHistory => ErrorCode::NoSnapshotHistory,
            Self::MalformedTimestamp { .. } => ErrorCode::MalformedTimestamp,
            Self::InvalidSnapshotDate { .. } => ErrorCode::InvalidSnapshotDate,
            Self::MalformedInput { .. } => ErrorCode::MalformedInput,
            Self::FetchFailed { .. } => ErrorCode::FetchFailed,
            Self::FetchParse { .. } => ErrorCode::FetchParseFailed,
            Self::OutputWrite { .. } => ErrorCode::OutputWriteFailed,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Remediation hint, falling back to the code's generic message.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }
}

pub type Result<T, E = TallyError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, TallyError};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidConfig,
            ErrorCode::InputNotFound,
            ErrorCode::ChartsNotFound,
            ErrorCode::NoSnapshotHistory,
            ErrorCode::MalformedTimestamp,
            ErrorCode::InvalidSnapshotDate,
            ErrorCode::MalformedInput,
            ErrorCode::FetchFailed,
            ErrorCode::FetchParseFailed,
            ErrorCode::OutputWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::NoSnapshotHistory.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn missing_history_suggests_bootstrap() {
        let err = TallyError::NoSnapshotHistory;
        assert_eq!(err.error_code(), ErrorCode::NoSnapshotHistory);
        assert!(err.suggestion().contains("bootstrap"));
    }

    #[test]
    fn input_not_found_names_the_path() {
        let err = TallyError::InputNotFound(PathBuf::from("issues.json"));
        assert_eq!(err.to_string(), "input file not found: issues.json");
    }
}
