//! Schema reconciliation tool for SQL Server to PostgreSQL migrations.
//!
//! This binary compares each configured database pair category by category
//! (tables, columns, constraints, indexes, triggers, routines, types, row
//! counts), writes a per-database diff report and prints the pass/fail
//! overview.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - No credentials stored or logged

mod output;

use std::path::PathBuf;

use clap::{Args, Parser};
use tracing::{error, info};

use dbrecon_core::{
    logging::init_logging, CompareContext, ReconcileConfig, Reconciler, Result, TypeCompat,
    UrlConnectionFactory, Verdict,
};

#[derive(Parser)]
#[command(name = "dbrecon")]
#[command(about = "SQL Server to PostgreSQL schema reconciliation")]
#[command(version)]
#[command(long_about = "
dbrecon - schema reconciliation for SQL Server to PostgreSQL migrations

Compares every configured database pair across eleven entity categories:
tables, columns, constraints, indexes, triggers, event triggers, views,
functions, user-defined types, procedures and per-table row counts.

Each category is classified (MATCHED / MISMATCH / MISSING in TARGET /
EXTRA in TARGET) and rolled up into a pass/fail verdict. Extra TARGET
entities never fail a category on their own.

SECURITY FEATURES:
- Read-only catalog queries only
- Credentials sanitized in logs and errors

EXAMPLES:
  dbrecon --config recon.json
  dbrecon --config recon.json --database trac --output-dir /tmp/reports
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Configuration file path
    #[arg(
        short,
        long,
        env = "DBRECON_CONFIG",
        default_value = "dbrecon.json",
        help = "JSON configuration file with connection URLs and database list"
    )]
    config: PathBuf,

    /// Reconcile a single database
    #[arg(
        long,
        help = "Reconcile only this database, overriding the configured list"
    )]
    database: Option<String>,

    /// Report output directory
    #[arg(
        short,
        long,
        default_value = "reports",
        help = "Directory for per-database JSON diff reports"
    )]
    output_dir: PathBuf,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let config = ReconcileConfig::load(&cli.config).await?;
    let databases = match &cli.database {
        Some(database) => vec![database.clone()],
        None => config.databases.clone(),
    };

    let ctx = CompareContext {
        types: TypeCompat::default(),
        procedure_renames: config.procedure_rename_map(),
        event_trigger_renames: config.event_trigger_rename_map(),
    };
    let factory = UrlConnectionFactory::new(
        config.source_url.clone(),
        config.target_url.clone(),
        config.excluded_schemas.clone(),
    );
    let reconciler = Reconciler::new(ctx);

    info!(databases = databases.len(), "starting batch reconciliation");
    let batch = reconciler.reconcile_all(&factory, &databases).await;

    for run in &batch.runs {
        let path = output::write_run_report(&cli.output_dir, run).await?;
        info!(database = %run.database, report = %path.display(), "report written");

        if !cli.global.quiet {
            output::print_overview(run);
        }
        let failed = run
            .summaries
            .iter()
            .filter(|s| s.verdict == Verdict::Failed)
            .count();
        if failed > 0 {
            info!(database = %run.database, categories = failed, "categories failed; see report");
        }
    }

    for failure in &batch.failures {
        error!(database = %failure.database, error = %failure.error, "database not reconciled");
    }

    // Category mismatches are report content; only databases that never
    // produced a report fail the process.
    if !batch.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
