//! Existence comparison for categories matched purely by name (tables,
//! views). Structural detail lives in the dedicated column/constraint/index
//! categories, so a name match alone counts as MATCHED here.

use crate::models::{Category, EntityRecord};
use crate::normalize::normalize_name;
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};
use crate::matcher::match_exact_by;

/// Name-only comparator for tables and views.
pub struct NamedEntityComparator {
    category: Category,
}

impl NamedEntityComparator {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

impl Comparator for NamedEntityComparator {
    fn category(&self) -> Category {
        self.category
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(self.category, report_columns(&["schema", "name"]));
        report.source_count = source.len() as u64;
        report.target_count = target.len() as u64;

        let matches = match_exact_by(source, target, |r| normalize_name(&r.name));

        let mut claimed = vec![false; target.len()];
        for (src, matched) in source.iter().zip(&matches) {
            let mut row = match matched {
                Some(i) => {
                    claimed[*i] = true;
                    let mut row = DiffRow::new(Status::Matched);
                    row.set("TARGET_schema", &target[*i].schema);
                    row.set("TARGET_name", &target[*i].name);
                    row
                }
                None => DiffRow::new(Status::MissingInTarget),
            };
            row.set("SOURCE_schema", &src.schema);
            row.set("SOURCE_name", &src.name);
            report.rows.push(row);
        }

        for (tgt, claimed) in target.iter().zip(&claimed) {
            if !claimed {
                let mut row = DiffRow::new(Status::ExtraInTarget);
                row.set("TARGET_schema", &tgt.schema);
                row.set("TARGET_name", &tgt.name);
                report.rows.push(row);
            }
        }

        report
    }
}
