use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tally_core::config::ProjectConfig;
use tally_core::error::TallyError;
use tally_core::lock::ChartsLock;
use tally_core::report::ReportDocument;
use tally_core::rollup::{Extension, MergePolicy, extend_series};
use tally_core::timing;
use tracing::info;

use crate::files;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue list JSON, as written by `tally extract`.
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Existing report document whose `charts` are extended.
    #[arg(long, value_name = "PATH")]
    pub charts: PathBuf,

    /// Where to write the new report. Defaults to `--charts`.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// How new records combine with stored ones.
    #[arg(long, value_name = "POLICY", default_value_t = MergePolicy::Append)]
    pub merge: MergePolicy,

    /// Include the trailing monthly opened/closed trend.
    #[arg(long)]
    pub trend: bool,

    /// Treat this UTC date as today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct UpdateSummary {
    pub output: String,
    pub up_to_date: bool,
    pub from: Option<String>,
    pub to: Option<String>,
    pub added: usize,
    pub records: usize,
    pub merge: MergePolicy,
}

/// Extend stored charts through today and rewrite the report.
pub fn run_update(args: &UpdateArgs, output: OutputMode, config: &ProjectConfig) -> Result<()> {
    let today = super::resolve_today(args.today);
    let target = args.output.clone().unwrap_or_else(|| args.charts.clone());
    if !args.charts.exists() {
        return Err(TallyError::ChartsNotFound(args.charts.clone()).into());
    }

    let lock = ChartsLock::acquire(&target, config.lock.timeout())
        .with_context(|| format!("locking {}", target.display()))?;

    let charts = timing::timed("load.read_charts", || files::read_charts(&args.charts))?;
    let issues = super::load_issues(&args.input)?;

    let (charts, extension) = timing::timed("rollup.extend", || {
        extend_series(charts, &issues, today, &config.rollup, args.merge)
    })
    .with_context(|| format!("extending charts from {}", args.charts.display()))?;

    let with_trend = args.trend || config.report.monthly_trend;
    let document = timing::timed("report.build", || {
        ReportDocument::build(&issues, charts, today, config, with_trend)
    });
    timing::timed("write.report", || files::write_json(&target, &document))
        .with_context(|| format!("writing report to {}", target.display()))?;
    lock.release();

    let (from, to) = match &extension {
        Extension::UpToDate { .. } => (None, None),
        Extension::Extended { from, to, .. } => (Some(from.to_string()), Some(to.to_string())),
    };
    let summary = UpdateSummary {
        output: target.display().to_string(),
        up_to_date: extension.is_up_to_date(),
        from,
        to,
        added: extension.records().len(),
        records: document.charts.len(),
        merge: args.merge,
    };
    info!(
        added = summary.added,
        records = summary.records,
        up_to_date = summary.up_to_date,
        "update complete"
    );

    render(output, &summary, |s, w| {
        match (&s.from, &s.to) {
            (Some(from), Some(to)) => writeln!(
                w,
                "Added {} snapshot records ({from} .. {to}, merge={})",
                s.added, s.merge
            )?,
            _ => writeln!(w, "Charts already up to date")?,
        }
        writeln!(w, "Wrote {} ({} records)", s.output, s.records)
    })
}
