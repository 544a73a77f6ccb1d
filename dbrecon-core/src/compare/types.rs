//! User-defined type comparison: fuzzy containment matching on squashed
//! names, tolerating the `_tt`/`_type` decoration drift migrations
//! introduce.

use crate::models::{Attributes, Category, EntityRecord};
use crate::normalize::{names_equivalent, squash};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};
use crate::matcher::match_fuzzy;

pub struct TypeComparator;

fn type_kind(record: &EntityRecord) -> &str {
    match &record.attributes {
        Attributes::Type { kind } => kind.as_str(),
        _ => "",
    }
}

fn fill_cells(row: &mut DiffRow, prefix: &str, record: &EntityRecord) {
    row.set(&format!("{prefix}_schema"), &record.schema);
    row.set(&format!("{prefix}_name"), &record.name);
    row.set(&format!("{prefix}_kind"), type_kind(record));
}

impl Comparator for TypeComparator {
    fn category(&self) -> Category {
        Category::Type
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report =
            CategoryReport::new(Category::Type, report_columns(&["schema", "name", "kind"]));
        report.source_count = source.len() as u64;
        report.target_count = target.len() as u64;

        let matches = match_fuzzy(
            source,
            target,
            |_, _| true,
            |a, b| names_equivalent(&squash(&a.name), &squash(&b.name)),
        );

        let mut claimed = vec![false; target.len()];
        for (src, matched) in source.iter().zip(&matches) {
            let mut row = match matched {
                Some(i) => {
                    claimed[*i] = true;
                    let mut row = DiffRow::new(Status::Matched);
                    fill_cells(&mut row, "TARGET", &target[*i]);
                    row
                }
                None => DiffRow::new(Status::MissingInTarget).with_reason("Missing in TARGET"),
            };
            fill_cells(&mut row, "SOURCE", src);
            report.rows.push(row);
        }

        for (tgt, claimed) in target.iter().zip(&claimed) {
            if !claimed {
                let mut row = DiffRow::new(Status::ExtraInTarget).with_reason("Extra in TARGET");
                fill_cells(&mut row, "TARGET", tgt);
                report.rows.push(row);
            }
        }

        report
    }
}
