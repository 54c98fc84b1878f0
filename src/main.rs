use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use covcheck::annotate::ChangedFiles;
use covcheck::cli::{self, AnnotateOptions, Level};
use covcheck::detect::Format;
use covcheck::diagnostics::{Diagnostics, TracingDiagnostics};
use covcheck::github;
use covcheck::report::{self, Conclusion};

/// covcheck: turn coverage reports into check-run annotations.
#[derive(Parser)]
#[command(name = "covcheck", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate missed lines and coverage drops in a report.
    Annotate {
        /// Path to the coverage report (simplecov JSON or JaCoCo XML).
        #[arg(env = "INPUT_COVERAGE_REPORT_PATH")]
        report: Option<PathBuf>,

        /// Earlier simplecov report; files identical to it are skipped.
        #[arg(long, env = "INPUT_BASE_COVERAGE_REPORT_PATH")]
        baseline: Option<PathBuf>,

        /// Override format detection (simplecov, jacoco).
        #[arg(long)]
        format: Option<String>,

        /// Repository path of a file changed in this change set (JaCoCo).
        /// Repeatable. With --github the pull request's files are used.
        #[arg(long = "changed-file")]
        changed_files: Vec<String>,

        /// Severity of emitted annotations.
        #[arg(long, value_enum, default_value_t = Level::Failure)]
        level: Level,

        /// Post a check run and pull-request comment to GitHub.
        #[arg(long)]
        github: bool,

        /// GitHub token (default: GITHUB_TOKEN).
        #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Print the missed line ranges of every file in a report.
    Ranges {
        /// Path to the coverage report.
        report: PathBuf,

        /// Override format detection (simplecov, jacoco).
        #[arg(long)]
        format: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Annotate {
            report,
            baseline,
            format,
            changed_files,
            level,
            github,
            token,
        } => cmd_annotate(
            report.unwrap_or_default(),
            baseline,
            format.as_deref(),
            changed_files,
            level,
            github.then_some(token),
        ),
        Commands::Ranges { report, format } => {
            let format = parse_format(format.as_deref())?;
            print!("{}", cli::cmd_ranges(&report, format)?);
            Ok(())
        }
    }
}

fn parse_format(format: Option<&str>) -> Result<Option<Format>> {
    format
        .map(|f| f.parse::<Format>())
        .transpose()
        .context("Invalid --format")
}

/// `post_token` is `Some(token)` when results should be posted.
fn cmd_annotate(
    report_path: PathBuf,
    baseline: Option<PathBuf>,
    format: Option<&str>,
    changed_files: Vec<String>,
    level: Level,
    post_token: Option<Option<String>>,
) -> Result<()> {
    let diag = TracingDiagnostics;
    let opts = AnnotateOptions {
        report: &report_path,
        baseline: baseline.as_deref(),
        format: parse_format(format)?,
        level,
    };

    let context = post_token
        .map(github::Context::from_env)
        .transpose()
        .context("Failed to resolve GitHub context")?;

    let changed: Option<&dyn ChangedFiles> = if !changed_files.is_empty() {
        Some(&changed_files as &dyn ChangedFiles)
    } else if let Some(ctx) = context.as_ref().filter(|c| c.pull_request.is_some()) {
        Some(ctx as &dyn ChangedFiles)
    } else {
        None
    };

    let (format, info) = cli::run_annotate(&opts, changed, &diag)?;
    print!("{}", report::format_text(format, &info));

    let conclusion = Conclusion::of(&info);
    if let Some(ctx) = &context {
        let check_id = ctx.create_check_run(&info)?;
        ctx.sync_comment(conclusion, check_id)?;
        diag.info(&format!("Check run {check_id} posted"));
    }

    if conclusion == Conclusion::Failure {
        bail!("Coverage dropped");
    }
    Ok(())
}
