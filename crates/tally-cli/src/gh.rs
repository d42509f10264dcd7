//! Thin wrapper over the `gh` CLI.

use std::io;
use std::process::{Command, Stdio};

use tally_core::error::{Result, TallyError};
use tally_core::extract::{
    self, BASE_FIELDS, BaseIssue, COMMENTS_FILTER, IssueComments, IssueLabels, IssueReactions,
    LABEL_FIELDS, Payloads, REACTION_FIELDS,
};
use tracing::{debug, info};

/// `gh issue list` has no "unlimited"; this is far above any real repo.
const ISSUE_LIST_LIMIT: &str = "999999";

/// Repository handle in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    pub owner: String,
    pub repo: String,
}

impl RepoName {
    /// Parse `owner/repo`.
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        match value.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(format!("expected OWNER/REPO, got '{value}'")),
        }
    }

    /// `owner-repo`, used to name output files.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn run_gh(args: &[&str]) -> Result<Vec<u8>> {
    let command = format!("gh {}", args.join(" "));
    debug!(%command, "running gh");

    let output = Command::new("gh")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| TallyError::FetchFailed {
            command: command.clone(),
            stderr: if err.kind() == io::ErrorKind::NotFound {
                "`gh` executable not found on PATH".to_string()
            } else {
                err.to_string()
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TallyError::FetchFailed {
            command,
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}

fn issue_list<T: for<'de> serde::Deserialize<'de>>(repo: &RepoName, fields: &str) -> Result<Vec<T>> {
    let repo = repo.to_string();
    let args = [
        "issue",
        "list",
        "--limit",
        ISSUE_LIST_LIMIT,
        "--state",
        "all",
        "--json",
        fields,
        "--repo",
        repo.as_str(),
    ];
    let stdout = run_gh(&args)?;
    extract::parse_payload(&format!("gh issue list --json {fields}"), &stdout)
}

fn comment_counts(repo: &RepoName) -> Result<Vec<IssueComments>> {
    let endpoint = format!("repos/{repo}/issues?state=all");
    let stdout = run_gh(&["api", "--paginate", &endpoint, "-q", COMMENTS_FILTER])?;
    extract::parse_pages(&format!("gh api {endpoint}"), &stdout)
}

/// Fetch every payload the join needs. Any failure aborts the run.
pub fn fetch_payloads(repo: &RepoName) -> Result<Payloads> {
    info!(%repo, "fetching base issue fields");
    let base: Vec<BaseIssue> = issue_list(repo, BASE_FIELDS)?;
    info!(%repo, "fetching labels");
    let labels: Vec<IssueLabels> = issue_list(repo, LABEL_FIELDS)?;
    info!(%repo, "fetching comment counts");
    let comments = comment_counts(repo)?;
    info!(%repo, "fetching reactions");
    let reactions: Vec<IssueReactions> = issue_list(repo, REACTION_FIELDS)?;

    info!(
        issues = base.len(),
        labels = labels.len(),
        comments = comments.len(),
        reactions = reactions.len(),
        "fetched issue payloads"
    );
    Ok(Payloads {
        base,
        labels,
        reactions,
        comments,
    })
}
