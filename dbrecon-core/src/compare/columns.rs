//! Column comparison: matched by (table, column) key, then checked for type
//! compatibility, nullability and default expression equality.

use crate::models::{Attributes, Category, EntityRecord};
use crate::normalize::{normalize_name, squash};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};
use crate::matcher::match_exact_by;

pub struct ColumnComparator;

const FIELDS: [&str; 6] = ["schema", "table", "name", "data_type", "nullable", "default"];

fn column_attrs(record: &EntityRecord) -> (&str, bool, Option<&str>) {
    match &record.attributes {
        Attributes::Column {
            data_type,
            is_nullable,
            default_value,
        } => (data_type, *is_nullable, default_value.as_deref()),
        _ => ("", true, None),
    }
}

/// Folds engine-specific default expression decoration: SQL Server wraps
/// defaults in parentheses (`((0))`), PostgreSQL appends a cast
/// (`'x'::character varying`) and both quote literals.
fn normalize_default(raw: Option<&str>) -> String {
    let mut value = raw.unwrap_or("").trim().to_lowercase();
    while value.len() >= 2 && value.starts_with('(') && value.ends_with(')') {
        value = value[1..value.len() - 1].trim().to_string();
    }
    if let Some(pos) = value.find("::") {
        value = value[..pos].trim().to_string();
    }
    value.trim_matches('\'').to_string()
}

fn fill_cells(row: &mut DiffRow, prefix: &str, record: &EntityRecord) {
    let (data_type, is_nullable, default_value) = column_attrs(record);
    row.set(&format!("{prefix}_schema"), &record.schema);
    row.set(&format!("{prefix}_table"), &record.table);
    row.set(&format!("{prefix}_name"), &record.name);
    row.set(&format!("{prefix}_data_type"), data_type);
    row.set(&format!("{prefix}_nullable"), if is_nullable { "YES" } else { "NO" });
    row.set(&format!("{prefix}_default"), default_value.unwrap_or(""));
}

impl Comparator for ColumnComparator {
    fn category(&self) -> Category {
        Category::Column
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(Category::Column, report_columns(&FIELDS));
        report.source_count = source.len() as u64;
        report.target_count = target.len() as u64;

        // Schemas differ across engines (dbo vs public), so the key is
        // table + column only.
        let matches = match_exact_by(source, target, |r| {
            (normalize_name(&r.table), squash(&r.name))
        });

        let mut claimed = vec![false; target.len()];
        for (src, matched) in source.iter().zip(&matches) {
            let mut row = match matched {
                Some(i) => {
                    claimed[*i] = true;
                    let tgt = &target[*i];
                    let mut row = DiffRow::new(compare_matched(src, tgt, ctx));
                    fill_cells(&mut row, "TARGET", tgt);
                    row
                }
                None => DiffRow::new(Status::MissingInTarget),
            };
            fill_cells(&mut row, "SOURCE", src);
            report.rows.push(row);
        }

        for (tgt, claimed) in target.iter().zip(&claimed) {
            if !claimed {
                let mut row = DiffRow::new(Status::ExtraInTarget);
                fill_cells(&mut row, "TARGET", tgt);
                report.rows.push(row);
            }
        }

        report
    }
}

/// First failing check wins: type, then nullability, then default.
fn compare_matched(src: &EntityRecord, tgt: &EntityRecord, ctx: &CompareContext) -> Status {
    let (src_type, src_nullable, src_default) = column_attrs(src);
    let (tgt_type, tgt_nullable, tgt_default) = column_attrs(tgt);

    if !ctx.types.compatible(src_type, tgt_type) {
        return Status::mismatch(format!("type mismatch ({src_type} vs {tgt_type})"));
    }
    if src_nullable != tgt_nullable {
        return Status::mismatch("nullability mismatch");
    }
    if normalize_default(src_default) != normalize_default(tgt_default) {
        return Status::mismatch("default mismatch");
    }
    Status::Matched
}
