//! Function comparison: exact name matching within the normal/trigger
//! partitions, so a trigger function never claims a plain function of the
//! same name.

use crate::models::{Attributes, Category, EntityRecord, FunctionKind};
use crate::normalize::{fold_default_schema, normalize_name};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};
use crate::matcher::match_exact_by;

pub struct FunctionComparator;

fn function_kind(record: &EntityRecord) -> FunctionKind {
    match &record.attributes {
        Attributes::Function { kind } => *kind,
        _ => FunctionKind::Normal,
    }
}

fn kind_label(kind: FunctionKind) -> &'static str {
    match kind {
        FunctionKind::Normal => "function",
        FunctionKind::Trigger => "trigger function",
    }
}

/// Same schema key after default-schema folding; any other difference on a
/// name match is real drift.
fn schemas_equivalent(a: &str, b: &str) -> bool {
    fold_default_schema(a) == fold_default_schema(b)
}

fn fill_cells(row: &mut DiffRow, prefix: &str, record: &EntityRecord) {
    row.set(&format!("{prefix}_schema"), &record.schema);
    row.set(&format!("{prefix}_name"), &record.name);
    row.set(&format!("{prefix}_kind"), kind_label(function_kind(record)));
}

impl Comparator for FunctionComparator {
    fn category(&self) -> Category {
        Category::Function
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(
            Category::Function,
            report_columns(&["schema", "name", "kind"]),
        );
        report.source_count = source.len() as u64;
        report.target_count = target.len() as u64;

        for kind in [FunctionKind::Normal, FunctionKind::Trigger] {
            let src_part: Vec<EntityRecord> = source
                .iter()
                .filter(|r| function_kind(r) == kind)
                .cloned()
                .collect();
            let tgt_part: Vec<EntityRecord> = target
                .iter()
                .filter(|r| function_kind(r) == kind)
                .cloned()
                .collect();

            let matches = match_exact_by(&src_part, &tgt_part, |r| normalize_name(&r.name));

            let mut claimed = vec![false; tgt_part.len()];
            for (src, matched) in src_part.iter().zip(&matches) {
                let mut row = match matched {
                    Some(i) => {
                        claimed[*i] = true;
                        let tgt = &tgt_part[*i];
                        let mut row = if schemas_equivalent(&src.schema, &tgt.schema) {
                            DiffRow::new(Status::Matched)
                        } else {
                            DiffRow::new(Status::mismatch("schema name mismatch"))
                                .with_reason("Schema name mismatch")
                        };
                        fill_cells(&mut row, "TARGET", tgt);
                        row
                    }
                    None => DiffRow::new(Status::MissingInTarget).with_reason("Missing in TARGET"),
                };
                fill_cells(&mut row, "SOURCE", src);
                report.rows.push(row);
            }

            for (tgt, claimed) in tgt_part.iter().zip(&claimed) {
                if !claimed {
                    let mut row =
                        DiffRow::new(Status::ExtraInTarget).with_reason("Extra in TARGET");
                    fill_cells(&mut row, "TARGET", tgt);
                    report.rows.push(row);
                }
            }
        }

        report
    }
}
