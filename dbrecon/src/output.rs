//! Report rendering: per-database JSON diff files and the stdout overview.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use dbrecon_core::{CategoryReport, DbReconError, Result, RunReport};

/// Renders one category's rows against its declared column order, so the
/// JSON output carries every declared column even when a cell is empty.
fn render_category(report: &CategoryReport) -> Value {
    let rows: Vec<Value> = report
        .rows
        .iter()
        .map(|row| {
            let cells: serde_json::Map<String, Value> = report
                .columns
                .iter()
                .map(|column| (column.clone(), Value::String(row.get(column))))
                .collect();
            Value::Object(cells)
        })
        .collect();

    json!({
        "category": report.category.as_str(),
        "columns": report.columns,
        "rows": rows,
        "source_count": report.source_count,
        "target_count": report.target_count,
    })
}

fn render_run(run: &RunReport) -> Value {
    json!({
        "database": run.database,
        "generated_at": run.generated_at.to_rfc3339(),
        "categories": run.reports.iter().map(render_category).collect::<Vec<_>>(),
        "summaries": run.summaries,
    })
}

/// Writes the diff report for one database as `<dir>/<database>_recon.json`.
pub async fn write_run_report(dir: &Path, run: &RunReport) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DbReconError::Io {
            context: format!("creating report directory {}", dir.display()),
            source: e,
        })?;

    let path = dir.join(format!("{}_recon.json", run.database));
    let rendered =
        serde_json::to_string_pretty(&render_run(run)).map_err(|e| DbReconError::Serialization {
            context: format!("rendering report for {}", run.database),
            source: e,
        })?;
    tokio::fs::write(&path, rendered)
        .await
        .map_err(|e| DbReconError::Io {
            context: format!("writing report {}", path.display()),
            source: e,
        })?;
    Ok(path)
}

/// Prints the per-category overview table for one database.
pub fn print_overview(run: &RunReport) {
    println!("\nDatabase: {}", run.database);
    println!(
        "{:<15} {:>10} {:>10} {:>6}  {:<7} {}",
        "Category", "SOURCE", "TARGET", "Diff", "Verdict", "Reason"
    );
    for summary in &run.summaries {
        println!(
            "{:<15} {:>10} {:>10} {:>6}  {:<7} {}",
            summary.category.as_str(),
            summary.source_count,
            summary.target_count,
            summary.difference,
            summary.verdict.to_string(),
            summary.reason
        );
    }
}
