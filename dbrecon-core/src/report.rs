//! Diff report model: statuses, diff rows, per-category reports and the
//! per-database run report.
//!
//! The status taxonomy is a closed enum so a comparator cannot emit an
//! undefined status value; the engine additionally rejects
//! `MATCHED (both zero)` outside the row-count category.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::models::Category;

/// Classification of one diff row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Matched,
    /// Row counts only: both tables are empty.
    MatchedBothZero,
    Mismatch { detail: Option<String> },
    MissingInTarget,
    ExtraInTarget,
}

impl Status {
    /// Mismatch with a detail message.
    pub fn mismatch(detail: impl Into<String>) -> Self {
        Status::Mismatch {
            detail: Some(detail.into()),
        }
    }

    /// Plain mismatch without detail.
    pub fn plain_mismatch() -> Self {
        Status::Mismatch { detail: None }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, Status::Mismatch { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Status::MissingInTarget)
    }

    pub fn is_extra(&self) -> bool {
        matches!(self, Status::ExtraInTarget)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Matched => write!(f, "MATCHED"),
            Status::MatchedBothZero => write!(f, "MATCHED (both zero)"),
            Status::Mismatch { detail: None } => write!(f, "MISMATCH"),
            Status::Mismatch { detail: Some(d) } => write!(f, "MISMATCH: {}", d),
            Status::MissingInTarget => write!(f, "MISSING in TARGET"),
            Status::ExtraInTarget => write!(f, "EXTRA in TARGET"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One report row: SOURCE-side cells, TARGET-side cells, a status and an
/// optional reason. Cells are keyed by output column name (`SOURCE_*` /
/// `TARGET_*`).
#[derive(Debug, Clone, Serialize)]
pub struct DiffRow {
    pub cells: BTreeMap<String, String>,
    pub status: Status,
    pub reason: Option<String>,
}

impl DiffRow {
    pub fn new(status: Status) -> Self {
        Self {
            cells: BTreeMap::new(),
            status,
            reason: None,
        }
    }

    /// Sets a cell value; empty values are stored so every declared column
    /// renders.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(column.to_string(), value.into());
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Renderer accessor: resolves the special `Reason` and `Status` columns
    /// as well as data cells. Unknown columns render empty.
    pub fn get(&self, column: &str) -> String {
        match column {
            "Status" => self.status.to_string(),
            "Reason" => self.reason.clone().unwrap_or_default(),
            _ => self.cells.get(column).cloned().unwrap_or_default(),
        }
    }
}

/// All diff rows for one category, with the ordered output columns and the
/// entity counts feeding the summary.
///
/// Column order contract: `SOURCE_*` columns, then `TARGET_*` columns, then
/// `Reason`, then `Status` last.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub columns: Vec<String>,
    pub rows: Vec<DiffRow>,
    /// Distinct SOURCE entities (summed row counts for the RowCount
    /// category).
    pub source_count: u64,
    /// Distinct TARGET entities (summed row counts for the RowCount
    /// category).
    pub target_count: u64,
}

impl CategoryReport {
    pub fn new(category: Category, columns: Vec<String>) -> Self {
        Self {
            category,
            columns,
            rows: Vec::new(),
            source_count: 0,
            target_count: 0,
        }
    }
}

/// Pass/fail verdict for one category summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Passed,
    Failed,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => write!(f, "Passed"),
            Verdict::Failed => write!(f, "Failed"),
        }
    }
}

/// Per-category rollup for the overview page. Built once all diff rows for
/// the category exist; never mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub source_count: u64,
    pub target_count: u64,
    /// `source_count - target_count`.
    pub difference: i64,
    pub verdict: Verdict,
    pub reason: String,
}

/// Complete output of one `reconcile(database)` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub database: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub reports: Vec<CategoryReport>,
    pub summaries: Vec<CategorySummary>,
}
