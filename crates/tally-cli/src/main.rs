#![forbid(unsafe_code)]

mod cmd;
mod files;
mod gh;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tally_core::config::resolve_config;
use tally_core::timing;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tally: per-area issue rollups and reports",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a per-phase timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json, self.quiet)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Data",
        about = "Export all issues of a GitHub repository",
        long_about = "Fetch every issue of OWNER/REPO through the `gh` CLI and write \
                      <owner>-<repo>-all-issues.json and <owner>-<repo>-issues.csv.",
        after_help = "EXAMPLES:\n    # Export into the current directory\n    tally extract rust-lang/rust\n\n    # Export elsewhere\n    tally extract rust-lang/rust --out-dir data"
    )]
    Extract(cmd::extract::ExtractArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Build the full snapshot history and report",
        long_about = "Compute one rollup record per area for every day from the earliest \
                      issue through today, then write the combined report document.",
        after_help = "EXAMPLES:\n    # Full rebuild\n    tally bootstrap --input acme-widgets-all-issues.json --output report.json\n\n    # With the monthly trend\n    tally bootstrap --input issues.json --output report.json --trend"
    )]
    Bootstrap(cmd::bootstrap::BootstrapArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Extend an existing report through today",
        long_about = "Append rollup records for the days after the latest stored snapshot \
                      and regenerate the issue lists from the fresh input.",
        after_help = "EXAMPLES:\n    # Daily refresh\n    tally update --input issues.json --charts report.json\n\n    # Replace overlapping records instead of appending\n    tally update --input issues.json --charts report.json --merge upsert"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tally completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tally=debug,info"
        } else {
            "tally=info,warn"
        })
    });

    let format = env::var("TALLY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        return timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        });
    }

    let project_root = env::current_dir()?;
    let config = resolve_config(&project_root, cli.config.as_deref())?;
    debug!(?config, "resolved config");

    match cli.command {
        Commands::Extract(ref args) => timing::timed("cmd.extract", || {
            cmd::extract::run_extract(args, output, &config)
        }),
        Commands::Bootstrap(ref args) => timing::timed("cmd.bootstrap", || {
            cmd::bootstrap::run_bootstrap(args, output, &config)
        }),
        Commands::Update(ref args) => timing::timed("cmd.update", || {
            cmd::update::run_update(args, output, &config)
        }),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let command_result = run(cli, output);

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            if let Ok(json) = serde_json::to_string_pretty(&report.to_json()) {
                eprintln!("timing report (json):");
                eprintln!("{json}");
            }
        }
    }

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::rollup::MergePolicy;

    #[test]
    fn timing_flag_parses_before_and_after_subcommand() {
        let before = Cli::parse_from(["tally", "--timing", "completions", "bash"]);
        assert!(before.timing);
        let after = Cli::parse_from(["tally", "completions", "bash", "--timing"]);
        assert!(after.timing);
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from([
            "tally", "bootstrap", "--input", "i.json", "--output", "r.json", "--json",
        ]);
        assert!(cli.json);
    }

    #[test]
    fn bootstrap_parses_paths_and_today() {
        let cli = Cli::parse_from([
            "tally",
            "bootstrap",
            "--input",
            "issues.json",
            "--output",
            "report.json",
            "--trend",
            "--today",
            "2024-01-15",
        ]);
        let Commands::Bootstrap(args) = cli.command else {
            panic!("expected bootstrap");
        };
        assert_eq!(args.input, PathBuf::from("issues.json"));
        assert!(args.trend);
        assert_eq!(args.today.map(|d| d.to_string()).as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn update_merge_defaults_to_append() {
        let cli = Cli::parse_from(["tally", "update", "--input", "i.json", "--charts", "c.json"]);
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.merge, MergePolicy::Append);
        assert!(args.output.is_none());
    }

    #[test]
    fn update_accepts_upsert() {
        let cli = Cli::parse_from([
            "tally", "update", "--input", "i.json", "--charts", "c.json", "--merge", "upsert",
        ]);
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.merge, MergePolicy::Upsert);
    }

    #[test]
    fn update_rejects_unknown_merge_policy() {
        let parsed = Cli::try_parse_from([
            "tally", "update", "--input", "i.json", "--charts", "c.json", "--merge", "squash",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn extract_requires_owner_and_repo() {
        assert!(Cli::try_parse_from(["tally", "extract", "widgets"]).is_err());
        let cli = Cli::parse_from(["tally", "extract", "acme/widgets", "--out-dir", "data"]);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.repo.file_stem(), "acme-widgets");
        assert_eq!(args.out_dir, PathBuf::from("data"));
    }

    #[test]
    fn config_and_quiet_are_global() {
        let cli = Cli::parse_from([
            "tally", "update", "--input", "i", "--charts", "c", "-q", "--config", "x.toml",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
