//! Listing database audit runner.
//!
//! This binary connects to the listing database, runs the four auditors,
//! prints a summary, writes the scored report and exits with a status that
//! reflects the grade.
//!
//! # Security Guarantees
//! - Read-only database session
//! - No credentials stored or logged
//! - Report validated before it is written

use anyhow::Context;
use clap::Parser;
use dbaudit_collect::{
    Cli, Command,
    exit::AuditExit,
    output::{render_catalog, render_catalog_json, render_report},
};
use dbaudit_core::AuditCatalog;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("Audit failed: {:#}", e);
            AuditExit::Fatal.into()
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<AuditExit> {
    dbaudit_core::logging::init_logging(cli.global.verbose, cli.global.quiet)?;

    dbaudit_core::initialize_report_validator()
        .context("Failed to initialize report validator")?;

    match &cli.command {
        None | Some(Command::Audit) => audit(cli).await,
        Some(Command::Test) => {
            test(cli).await?;
            Ok(AuditExit::Passed)
        }
        Some(Command::Catalog(args)) => {
            let catalog = AuditCatalog::listings();
            if args.json {
                println!("{}", render_catalog_json(&catalog)?);
            } else {
                println!("{}", render_catalog(&catalog));
            }
            Ok(AuditExit::Passed)
        }
    }
}

#[cfg(feature = "postgresql")]
async fn audit(cli: &Cli) -> anyhow::Result<AuditExit> {
    let database_url = cli.require_database_url()?;
    let report = dbaudit_collect::collect::audit_database(database_url, &cli.output).await?;

    if !cli.global.quiet {
        println!("{}", render_report(&report));
        println!();
        println!("Detailed audit saved to: {}", cli.output.display());
    }

    Ok(AuditExit::from_report(&report))
}

#[cfg(feature = "postgresql")]
async fn test(cli: &Cli) -> anyhow::Result<()> {
    let database_url = cli.require_database_url()?;
    dbaudit_collect::collect::test_connection(database_url).await?;
    Ok(())
}

#[cfg(not(feature = "postgresql"))]
async fn audit(_cli: &Cli) -> anyhow::Result<AuditExit> {
    anyhow::bail!("PostgreSQL support not compiled in. Rebuild with --features postgresql")
}

#[cfg(not(feature = "postgresql"))]
async fn test(_cli: &Cli) -> anyhow::Result<()> {
    anyhow::bail!("PostgreSQL support not compiled in. Rebuild with --features postgresql")
}
