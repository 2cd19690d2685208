//! Vigilar CLI: run the e2e suite and render the dashboard.
//!
//! ## Usage
//!
//! ```bash
//! vigilar run --browser chromium            # Run the e2e suite headless
//! vigilar run --browser edge --headed      # Watch it drive Edge
//! vigilar report --results report/results.json --output report/dashboard.html
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing::info;

use vigilar::report::SuiteReport;
use vigilar::{config, BrowserKind, VigilarError, VigilarResult};

#[derive(Debug, Parser)]
#[command(name = "vigilar", version, about = "Browser-driven E2E suite for DocIQ")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the e2e suite against the configured deployment
    Run(RunArgs),
    /// Render the HTML dashboard (and JUnit XML) from a results file
    Report(ReportArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Browser engine: chromium | chrome | edge
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Config file path (defaults to config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run tests whose names contain this string
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, clap::Args)]
struct ReportArgs {
    /// Machine-readable results file
    #[arg(long, default_value = "report/results.json")]
    results: PathBuf,

    /// Dashboard output path
    #[arg(long, default_value = "report/dashboard.html")]
    output: PathBuf,

    /// Also write JUnit XML next to the dashboard
    #[arg(long)]
    junit: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "vigilar=info",
        1 => "vigilar=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> VigilarResult<()> {
    match cli.command {
        Commands::Run(args) => run_suite(&args),
        Commands::Report(args) => render_report(&args),
    }
}

/// The suite's tests live in the library crate's e2e target; the runner
/// exports the selection through the environment and executes them
/// sequentially: one browser session, one page, one thread of control.
fn run_suite(args: &RunArgs) -> VigilarResult<()> {
    let kind: BrowserKind = args.browser.parse()?;
    info!(browser = %kind, headed = args.headed, "launching e2e suite");

    let mut command = std::process::Command::new("cargo");
    command
        .args([
            "test",
            "-p",
            "vigilar",
            "--features",
            "browser",
            "--test",
            "e2e_statement",
        ])
        .env(config::BROWSER_ENV, kind.as_str())
        .env(config::HEADLESS_ENV, if args.headed { "0" } else { "1" });

    if let Some(ref path) = args.config {
        command.env(config::CONFIG_PATH_ENV, path);
    }

    command.arg("--");
    if let Some(ref filter) = args.filter {
        command.arg(filter);
    }
    command.args(["--ignored", "--test-threads=1"]);

    let status = command.status().map_err(|e| VigilarError::Config {
        message: format!("failed to invoke cargo: {e}"),
    })?;

    if status.success() {
        println!("{}", style("suite passed").green().bold());
        Ok(())
    } else {
        Err(VigilarError::Assertion {
            message: "suite reported failures".to_string(),
        })
    }
}

fn render_report(args: &ReportArgs) -> VigilarResult<()> {
    let report = SuiteReport::from_json_file(&args.results)?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    report.write_html(&args.output)?;
    info!(output = %args.output.display(), "dashboard written");

    if args.junit {
        let junit = args.output.with_extension("xml");
        report.write_junit(&junit)?;
        info!(output = %junit.display(), "junit written");
    }

    let summary = report.summary();
    if report.all_passed() {
        println!("{}", style(summary).green());
    } else {
        println!("{}", style(summary).red());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "vigilar", "run", "--browser", "edge", "--headed", "--filter", "history",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.browser, "edge");
                assert!(args.headed);
                assert_eq!(args.filter.as_deref(), Some("history"));
            }
            Commands::Report(_) => panic!("expected run"),
        }
    }

    #[test]
    fn test_report_args_defaults() {
        let cli = Cli::try_parse_from(["vigilar", "report"]).unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.results, PathBuf::from("report/results.json"));
                assert!(!args.junit);
            }
            Commands::Run(_) => panic!("expected report"),
        }
    }

    #[test]
    fn test_unknown_browser_rejected_at_run() {
        let args = RunArgs {
            browser: "netscape".into(),
            headed: false,
            config: None,
            filter: None,
        };
        assert!(matches!(
            run_suite(&args),
            Err(VigilarError::Config { .. })
        ));
    }

    #[test]
    fn test_render_report_writes_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        std::fs::write(
            &results,
            r#"{"title": "t", "records": [
                {"name": "a", "module": "m", "status": "passed", "duration_ms": 5}
            ]}"#,
        )
        .unwrap();

        let output = dir.path().join("report/dashboard.html");
        render_report(&ReportArgs {
            results,
            output: output.clone(),
            junit: true,
        })
        .unwrap();

        assert!(output.exists());
        assert!(output.with_extension("xml").exists());
        let html = std::fs::read_to_string(output).unwrap();
        assert!(html.contains("1/1 passed"));
    }
}
