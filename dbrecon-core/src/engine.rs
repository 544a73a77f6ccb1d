//! Reconciliation orchestration: drives extraction and comparison for one
//! database, and batch loops over many with per-database failure isolation.

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::adapters::ExtractionAdapter;
use crate::compare::{default_comparators, Comparator, CompareContext};
use crate::error::{DbReconError, Result};
use crate::models::Category;
use crate::report::{CategoryReport, RunReport, Status, Verdict};
use crate::summary::summarize;

/// Opens engine connections per database name in a batch run.
///
/// Separated from the reconciler so batch tests can inject adapters backed
/// by canned records instead of live databases.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open_source(&self, database: &str) -> Result<Box<dyn ExtractionAdapter>>;
    async fn open_target(&self, database: &str) -> Result<Box<dyn ExtractionAdapter>>;
}

/// One database that failed during a batch run.
#[derive(Debug)]
pub struct DatabaseFailure {
    pub database: String,
    pub error: DbReconError,
}

/// Outcome of a batch run: completed reports plus isolated failures.
#[derive(Debug)]
pub struct BatchReport {
    pub runs: Vec<RunReport>,
    pub failures: Vec<DatabaseFailure>,
}

impl BatchReport {
    /// True when every configured database produced a report.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives the fixed category pipeline over a source/target adapter pair.
pub struct Reconciler {
    ctx: CompareContext,
    comparators: Vec<Box<dyn Comparator>>,
}

impl Reconciler {
    pub fn new(ctx: CompareContext) -> Self {
        Self {
            ctx,
            comparators: default_comparators(),
        }
    }

    /// Replaces the comparator set; used by tests exercising a single
    /// category.
    pub fn with_comparators(mut self, comparators: Vec<Box<dyn Comparator>>) -> Self {
        self.comparators = comparators;
        self
    }

    /// Runs every registered category against one database pair.
    ///
    /// Categories run strictly in registration order; a failed extraction
    /// aborts the remaining categories for this database.
    pub async fn reconcile(
        &self,
        source: &dyn ExtractionAdapter,
        target: &dyn ExtractionAdapter,
        database: &str,
    ) -> Result<RunReport> {
        info!(database, "starting reconciliation");

        let mut reports = Vec::with_capacity(self.comparators.len());
        let mut summaries = Vec::with_capacity(self.comparators.len());

        for comparator in &self.comparators {
            let category = comparator.category();
            debug!(category = %category, "extracting");

            let source_records = source.extract(category).await?;
            let target_records = target.extract(category).await?;
            debug!(
                category = %category,
                source = source_records.len(),
                target = target_records.len(),
                "extracted"
            );

            let report = comparator.compare(&source_records, &target_records, &self.ctx);
            enforce_status_taxonomy(&report)?;

            let summary = summarize(&report);
            match summary.verdict {
                Verdict::Passed => info!(category = %category, "passed"),
                Verdict::Failed => info!(category = %category, reason = %summary.reason, "failed"),
            }
            reports.push(report);
            summaries.push(summary);
        }

        Ok(RunReport {
            database: database.to_string(),
            generated_at: chrono::Utc::now(),
            reports,
            summaries,
        })
    }

    /// Reconciles every configured database, isolating failures: one broken
    /// database is recorded and the loop moves on to the next.
    pub async fn reconcile_all(
        &self,
        factory: &dyn ConnectionFactory,
        databases: &[String],
    ) -> BatchReport {
        let mut runs = Vec::new();
        let mut failures = Vec::new();

        for database in databases {
            match self.reconcile_one(factory, database).await {
                Ok(run) => runs.push(run),
                Err(err) => {
                    error!(database, error = %err, "database failed; continuing batch");
                    failures.push(DatabaseFailure {
                        database: database.clone(),
                        error: err,
                    });
                }
            }
        }

        BatchReport { runs, failures }
    }

    async fn reconcile_one(
        &self,
        factory: &dyn ConnectionFactory,
        database: &str,
    ) -> Result<RunReport> {
        let source = factory.open_source(database).await?;
        let target = factory.open_target(database).await?;
        self.reconcile(source.as_ref(), target.as_ref(), database).await
    }
}

/// `MATCHED (both zero)` is reserved for row counts; a comparator emitting
/// it elsewhere is defective and the run fails rather than mislabeling.
fn enforce_status_taxonomy(report: &CategoryReport) -> Result<()> {
    if report.category == Category::RowCount {
        return Ok(());
    }
    if report
        .rows
        .iter()
        .any(|row| row.status == Status::MatchedBothZero)
    {
        return Err(DbReconError::inconsistency(
            report.category,
            "MATCHED (both zero) outside RowCounts",
        ));
    }
    Ok(())
}
