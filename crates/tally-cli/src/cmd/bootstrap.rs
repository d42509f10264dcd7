use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tally_core::config::ProjectConfig;
use tally_core::report::ReportDocument;
use tally_core::rollup::{SNAPSHOT_DATE_FORMAT, bootstrap};
use tally_core::timing;
use tracing::info;

use crate::files;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Issue list JSON, as written by `tally extract`.
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Where to write the report document.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Include the trailing monthly opened/closed trend.
    #[arg(long)]
    pub trend: bool,

    /// Treat this UTC date as today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct BootstrapSummary {
    pub output: String,
    pub issues: usize,
    pub areas: usize,
    pub records: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub monthly_trend: bool,
}

/// Rebuild the full snapshot history and write a fresh report.
pub fn run_bootstrap(args: &BootstrapArgs, output: OutputMode, config: &ProjectConfig) -> Result<()> {
    let today = super::resolve_today(args.today);
    let issues = super::load_issues(&args.input)?;

    let charts = timing::timed("rollup.bootstrap", || bootstrap(&issues, today, &config.rollup));
    let with_trend = args.trend || config.report.monthly_trend;
    let document = timing::timed("report.build", || {
        ReportDocument::build(&issues, charts, today, config, with_trend)
    });

    timing::timed("write.report", || files::write_json(&args.output, &document))
        .with_context(|| format!("writing report to {}", args.output.display()))?;

    let summary = BootstrapSummary {
        output: args.output.display().to_string(),
        issues: issues.len(),
        areas: document
            .charts
            .iter()
            .map(|record| record.area.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        records: document.charts.len(),
        first_date: document.charts.first().map(|record| record.date.clone()),
        last_date: (!document.charts.is_empty())
            .then(|| today.format(SNAPSHOT_DATE_FORMAT).to_string()),
        monthly_trend: document.monthly_trend.is_some(),
    };
    info!(records = summary.records, output = %summary.output, "bootstrap complete");

    render(output, &summary, |s, w| {
        writeln!(w, "Wrote {}", s.output)?;
        match (&s.first_date, &s.last_date) {
            (Some(first), Some(last)) => writeln!(
                w,
                "  {} issues, {} areas, {} snapshot records ({first} .. {last})",
                s.issues, s.areas, s.records
            ),
            _ => writeln!(w, "  no issues; snapshot history is empty"),
        }
    })
}
