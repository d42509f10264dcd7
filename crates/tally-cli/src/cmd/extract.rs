use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tally_core::config::ProjectConfig;
use tally_core::extract::{ExtractedIssue, join};
use tally_core::flatten::{describe, flatten, to_csv};
use tally_core::timing;
use tracing::{debug, info};

use crate::files;
use crate::gh::{self, RepoName};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Repository to read, as OWNER/REPO.
    #[arg(value_name = "OWNER/REPO", value_parser = RepoName::parse)]
    pub repo: RepoName,

    /// Directory for the JSON and CSV outputs.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExtractSummary {
    pub repo: String,
    pub issues: usize,
    pub rows: usize,
    pub json: String,
    pub csv: String,
}

/// Output file paths for `repo` under `dir`.
pub fn output_paths(dir: &Path, repo: &RepoName) -> (PathBuf, PathBuf) {
    let stem = repo.file_stem();
    (
        dir.join(format!("{stem}-all-issues.json")),
        dir.join(format!("{stem}-issues.csv")),
    )
}

/// Fetch all issues for a repository and write the JSON and CSV exports.
pub fn run_extract(args: &ExtractArgs, output: OutputMode, config: &ProjectConfig) -> Result<()> {
    let payloads = timing::timed("extract.fetch", || gh::fetch_payloads(&args.repo))
        .with_context(|| format!("fetching issues for {}", args.repo))?;

    let issues = timing::timed("extract.join", || join(payloads, &config.labels));
    let rows = flatten(&issues);
    debug!(areas = %describe(&rows), "flattened issue rows");

    let (json_path, csv_path) = output_paths(&args.out_dir, &args.repo);
    let extracted: Vec<ExtractedIssue> = issues.into_iter().map(ExtractedIssue::from).collect();

    timing::timed("write.issues", || {
        files::write_json(&json_path, &extracted)?;
        files::write_atomic(&csv_path, to_csv(&rows).as_bytes())
    })
    .context("writing extracted issues")?;

    let summary = ExtractSummary {
        repo: args.repo.to_string(),
        issues: extracted.len(),
        rows: rows.len(),
        json: json_path.display().to_string(),
        csv: csv_path.display().to_string(),
    };
    info!(repo = %summary.repo, issues = summary.issues, "extract complete");

    render(output, &summary, |s, w| {
        writeln!(w, "Processed {} issues from {}", s.issues, s.repo)?;
        writeln!(w, "  {}", s.json)?;
        writeln!(w, "  {} ({} rows)", s.csv, s.rows)
    })
}
