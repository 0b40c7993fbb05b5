//! Post-processor for persisted dbaudit reports.
//!
//! Reads a report written by `dbaudit-collect`, derives the completion
//! analysis and renders it as text, Markdown or JSON. Never touches the
//! database.

mod render;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dbaudit_core::{CompletionAnalysis, DEFAULT_REPORT_PATH, load_report};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Exit status when the report cannot be read, validated or rendered.
const EXIT_INVALID_REPORT: u8 = 2;

/// Command-line interface for the report post-processor
#[derive(Parser)]
#[command(name = "dbaudit")]
#[command(about = "Completion analysis for dbaudit reports")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Available commands for the post-processor
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a persisted audit report
    Analyze {
        /// Input report path
        #[arg(short, long, default_value = DEFAULT_REPORT_PATH)]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file path (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

/// Available output formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Terminal text
    Text,
    /// Markdown document
    Markdown,
    /// JSON structured output
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dbaudit_core::logging::init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_INVALID_REPORT);
    }

    match cli.command {
        Some(Commands::Analyze {
            input,
            format,
            output,
        }) => match analyze(&input, format, output.as_deref()).await {
            Ok(analysis) => ExitCode::from(u8::from(!analysis.passing)),
            Err(e) => {
                eprintln!("Analysis failed: {:#}", e);
                ExitCode::from(EXIT_INVALID_REPORT)
            }
        },
        None => {
            println!("dbaudit v{}", env!("CARGO_PKG_VERSION"));
            println!("Completion analysis for dbaudit reports");
            println!("Use --help for available commands");
            ExitCode::SUCCESS
        }
    }
}

async fn analyze(
    input: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<CompletionAnalysis> {
    let report = load_report(input)
        .await
        .with_context(|| format!("Cannot use report {}", input.display()))?;
    info!(
        "Loaded report from {} ({})",
        input.display(),
        report.timestamp.to_rfc3339()
    );

    let analysis = CompletionAnalysis::from_report(&report);
    let rendered = match format {
        OutputFormat::Text => render::render_text(&report, &analysis),
        OutputFormat::Markdown => render::render_markdown(&report, &analysis)
            .context("Failed to render Markdown analysis")?,
        OutputFormat::Json => {
            render::render_json(&analysis).context("Failed to serialize analysis")?
        }
    };

    match output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Analysis written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(analysis)
}
