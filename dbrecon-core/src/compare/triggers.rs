//! Table trigger comparison: grouped per table, with event-action suffixes
//! folded away so a single multi-event SOURCE trigger matches the per-event
//! triggers a migration splits it into.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Category, EntityRecord};
use crate::normalize::{names_equivalent, normalize_name, squash, strip_event_suffix};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};

pub struct TriggerComparator;

#[derive(Default)]
struct TableGroup {
    schema: String,
    table: String,
    names: BTreeSet<String>,
}

impl TableGroup {
    fn add(&mut self, record: &EntityRecord) {
        if self.table.is_empty() {
            self.schema = record.schema.clone();
            self.table = record.table.clone();
        }
        self.names.insert(record.name.clone());
    }

    fn display_list(&self) -> String {
        self.names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn group_by_table(records: &[EntityRecord]) -> BTreeMap<String, TableGroup> {
    let mut groups: BTreeMap<String, TableGroup> = BTreeMap::new();
    for record in records {
        groups
            .entry(normalize_name(&record.table))
            .or_default()
            .add(record);
    }
    groups
}

/// Event suffix removed, then squashed: `trg_Audit_INSERT` and
/// `trgaudit_insert` both key as `trgaudit`.
fn trigger_base(name: &str) -> String {
    squash(&strip_event_suffix(name))
}

/// A SOURCE trigger is covered when some TARGET trigger shares its base name
/// or one base contains the other (migrations prepend table names).
fn covered(name: &str, others: &BTreeSet<String>) -> bool {
    let base = trigger_base(name);
    others
        .iter()
        .any(|other| names_equivalent(&base, &trigger_base(other)))
}

impl Comparator for TriggerComparator {
    fn category(&self) -> Category {
        Category::Trigger
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(
            Category::Trigger,
            report_columns(&["schema", "table", "triggers", "count"]),
        );

        let source_groups = group_by_table(source);
        let mut target_groups = group_by_table(target);

        report.source_count = source_groups.values().map(|g| g.names.len() as u64).sum();
        report.target_count = target_groups.values().map(|g| g.names.len() as u64).sum();

        for (key, src_group) in &source_groups {
            let tgt_group = target_groups.remove(key);
            let empty = BTreeSet::new();
            let tgt_names = tgt_group.as_ref().map_or(&empty, |g| &g.names);

            let missing: Vec<&str> = src_group
                .names
                .iter()
                .filter(|name| !covered(name, tgt_names))
                .map(String::as_str)
                .collect();
            let extra: Vec<&str> = tgt_names
                .iter()
                .filter(|name| !covered(name, &src_group.names))
                .map(String::as_str)
                .collect();

            let mut reason_parts = Vec::new();
            if !missing.is_empty() {
                reason_parts.push(format!("Missing in TARGET: {}", missing.join(", ")));
            }
            if !extra.is_empty() {
                reason_parts.push(format!("Extra in TARGET: {}", extra.join(", ")));
            }

            // Any uncovered name on either side fails the table; EXTRA is
            // reserved for tables with no SOURCE triggers at all.
            let mut row = if missing.is_empty() && extra.is_empty() {
                DiffRow::new(Status::Matched)
            } else {
                DiffRow::new(Status::plain_mismatch()).with_reason(reason_parts.join("; "))
            };

            row.set("SOURCE_schema", &src_group.schema);
            row.set("SOURCE_table", &src_group.table);
            row.set("SOURCE_triggers", src_group.display_list());
            row.set("SOURCE_count", src_group.names.len().to_string());
            if let Some(tgt_group) = &tgt_group {
                row.set("TARGET_schema", &tgt_group.schema);
                row.set("TARGET_table", &tgt_group.table);
                row.set("TARGET_triggers", tgt_group.display_list());
                row.set("TARGET_count", tgt_group.names.len().to_string());
            }
            report.rows.push(row);
        }

        for tgt_group in target_groups.values() {
            let mut row = DiffRow::new(Status::ExtraInTarget)
                .with_reason(format!("Extra in TARGET: {}", tgt_group.display_list()));
            row.set("TARGET_schema", &tgt_group.schema);
            row.set("TARGET_table", &tgt_group.table);
            row.set("TARGET_triggers", tgt_group.display_list());
            row.set("TARGET_count", tgt_group.names.len().to_string());
            report.rows.push(row);
        }

        report
    }
}
