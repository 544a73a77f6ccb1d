//! Row count comparison: per-table totals keyed by schema and table name
//! (the engines' default schemas fold together), with a percentage in the
//! mismatch detail so a near-miss reads differently from an empty table.

use std::collections::BTreeMap;

use crate::models::{Attributes, Category, EntityRecord};
use crate::normalize::{fold_default_schema, normalize_name};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};

pub struct RowCountComparator;

struct TableCount {
    schema: String,
    table: String,
    /// None when the count query failed for this table.
    rows: Option<u64>,
}

fn by_table(records: &[EntityRecord]) -> BTreeMap<(String, String), TableCount> {
    let mut counts = BTreeMap::new();
    for record in records {
        let rows = match &record.attributes {
            Attributes::RowCount { rows } => *rows,
            _ => None,
        };
        counts.insert(
            (
                fold_default_schema(&record.schema),
                normalize_name(&record.name),
            ),
            TableCount {
                schema: record.schema.clone(),
                table: record.name.clone(),
                rows,
            },
        );
    }
    counts
}

/// Integer match percentage; zero when either side is empty.
fn match_percent(source: u64, target: u64) -> u64 {
    if source == 0 || target == 0 {
        return 0;
    }
    source.min(target) * 100 / source.max(target)
}

fn count_cell(rows: Option<u64>) -> String {
    rows.map(|n| n.to_string()).unwrap_or_default()
}

impl Comparator for RowCountComparator {
    fn category(&self) -> Category {
        Category::RowCount
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(
            Category::RowCount,
            report_columns(&["schema", "table", "count"]),
        );

        let source_counts = by_table(source);
        let mut target_counts = by_table(target);

        // Summary counts are summed rows, not entity counts; failed counts
        // contribute zero.
        report.source_count = source_counts.values().filter_map(|c| c.rows).sum();
        report.target_count = target_counts.values().filter_map(|c| c.rows).sum();

        for (key, src) in &source_counts {
            let tgt = target_counts.remove(key);
            let src_rows = src.rows.unwrap_or(0);
            let tgt_rows = tgt.as_ref().and_then(|t| t.rows).unwrap_or(0);

            let status = if tgt.is_none() {
                Status::MissingInTarget
            } else if src_rows == 0 && tgt_rows == 0 {
                Status::MatchedBothZero
            } else if src_rows == tgt_rows {
                Status::Matched
            } else {
                Status::mismatch(format!(
                    "{}% match (source: {src_rows}, target: {tgt_rows})",
                    match_percent(src_rows, tgt_rows)
                ))
            };

            let mut row = DiffRow::new(status);
            row.set("SOURCE_schema", &src.schema);
            row.set("SOURCE_table", &src.table);
            row.set("SOURCE_count", count_cell(src.rows));
            if let Some(tgt) = &tgt {
                row.set("TARGET_schema", &tgt.schema);
                row.set("TARGET_table", &tgt.table);
                row.set("TARGET_count", count_cell(tgt.rows));
            }
            report.rows.push(row);
        }

        for tgt in target_counts.values() {
            let mut row = DiffRow::new(Status::ExtraInTarget);
            row.set("TARGET_schema", &tgt.schema);
            row.set("TARGET_table", &tgt.table);
            row.set("TARGET_count", count_cell(tgt.rows));
            report.rows.push(row);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;

    fn count(origin: Origin, table: &str, rows: Option<u64>) -> EntityRecord {
        let schema = match origin {
            Origin::Source => "dbo",
            Origin::Target => "public",
        };
        count_in(origin, schema, table, rows)
    }

    fn count_in(origin: Origin, schema: &str, table: &str, rows: Option<u64>) -> EntityRecord {
        EntityRecord::new(Category::RowCount, origin, schema, table)
            .with_attributes(Attributes::RowCount { rows })
    }

    fn compare(source: Vec<EntityRecord>, target: Vec<EntityRecord>) -> CategoryReport {
        RowCountComparator.compare(&source, &target, &CompareContext::default())
    }

    #[test]
    fn test_equal_counts_match() {
        let report = compare(
            vec![count(Origin::Source, "orders", Some(42))],
            vec![count(Origin::Target, "orders", Some(42))],
        );

        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.source_count, 42);
        assert_eq!(report.target_count, 42);
    }

    #[test]
    fn test_both_zero_gets_distinct_status() {
        let report = compare(
            vec![count(Origin::Source, "staging", Some(0))],
            vec![count(Origin::Target, "staging", Some(0))],
        );

        assert_eq!(report.rows[0].status, Status::MatchedBothZero);
    }

    #[test]
    fn test_mismatch_embeds_percentage() {
        let report = compare(
            vec![count(Origin::Source, "orders", Some(100))],
            vec![count(Origin::Target, "orders", Some(50))],
        );

        assert_eq!(
            report.rows[0].status,
            Status::mismatch("50% match (source: 100, target: 50)")
        );
    }

    #[test]
    fn test_one_side_empty_is_zero_percent() {
        let report = compare(
            vec![count(Origin::Source, "orders", Some(100))],
            vec![count(Origin::Target, "orders", Some(0))],
        );

        assert_eq!(
            report.rows[0].status,
            Status::mismatch("0% match (source: 100, target: 0)")
        );
    }

    #[test]
    fn test_failed_count_treated_as_zero() {
        let report = compare(
            vec![count(Origin::Source, "broken", None)],
            vec![count(Origin::Target, "broken", Some(0))],
        );

        assert_eq!(report.rows[0].status, Status::MatchedBothZero);
        assert_eq!(report.rows[0].get("SOURCE_count"), "");
        assert_eq!(report.rows[0].get("TARGET_count"), "0");
    }

    #[test]
    fn test_same_table_name_in_different_schemas_kept_apart() {
        // Non-default schemas survive migration verbatim, so sales.orders
        // never absorbs archive.orders.
        let report = compare(
            vec![
                count_in(Origin::Source, "sales", "orders", Some(10)),
                count_in(Origin::Source, "archive", "orders", Some(5)),
            ],
            vec![count_in(Origin::Target, "sales", "orders", Some(10))],
        );

        assert_eq!(report.rows.len(), 2);
        let archive = report
            .rows
            .iter()
            .find(|r| r.get("SOURCE_schema") == "archive")
            .unwrap();
        assert_eq!(archive.status, Status::MissingInTarget);
        let sales = report
            .rows
            .iter()
            .find(|r| r.get("SOURCE_schema") == "sales")
            .unwrap();
        assert_eq!(sales.status, Status::Matched);
    }

    #[test]
    fn test_missing_and_extra_tables() {
        let report = compare(
            vec![count(Origin::Source, "legacy", Some(10))],
            vec![count(Origin::Target, "audit", Some(5))],
        );

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].status, Status::MissingInTarget);
        assert_eq!(report.rows[1].status, Status::ExtraInTarget);
    }
}
