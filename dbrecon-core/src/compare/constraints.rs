//! Constraint comparison: grouped per table and compared by distinct
//! constraint counts per kind, not by individual names.
//!
//! Auto-generated constraint names never survive a migration (`PK__Orders__
//! 3214EC07` becomes `orders_pkey`), so name-level matching would drown the
//! report in false mismatches. Counting distinct constraints per kind per
//! table catches the real failures: a dropped foreign key, a lost check.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Attributes, Category, ConstraintKind, EntityRecord};
use crate::normalize::{normalize_constraint_name, normalize_name};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};

pub struct ConstraintComparator;

const KIND_ORDER: [ConstraintKind; 5] = [
    ConstraintKind::PrimaryKey,
    ConstraintKind::ForeignKey,
    ConstraintKind::Check,
    ConstraintKind::Default,
    ConstraintKind::Other,
];

#[derive(Default)]
struct TableGroup {
    schema: String,
    table: String,
    display: BTreeSet<String>,
    per_kind: BTreeMap<&'static str, BTreeSet<String>>,
}

impl TableGroup {
    fn add(&mut self, record: &EntityRecord) {
        if self.table.is_empty() {
            self.schema = record.schema.clone();
            self.table = record.table.clone();
        }
        let kind = match &record.attributes {
            Attributes::Constraint { kind, .. } => *kind,
            _ => ConstraintKind::Other,
        };
        // Distinct names are tracked per kind: default constraints are named
        // after their column and would otherwise collide with a check
        // constraint on the same column.
        let key = match kind {
            ConstraintKind::Check | ConstraintKind::Default => {
                normalize_constraint_name(&record.name)
            }
            _ => normalize_name(&record.name),
        };
        self.display.insert(record.name.clone());
        self.per_kind.entry(kind.label()).or_default().insert(key);
    }

    fn count_for(&self, kind: ConstraintKind) -> usize {
        self.per_kind.get(kind.label()).map_or(0, BTreeSet::len)
    }

    fn total(&self) -> usize {
        self.per_kind.values().map(BTreeSet::len).sum()
    }

    fn display_list(&self) -> String {
        self.display.iter().cloned().collect::<Vec<_>>().join(", ")
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

impl Comparator for ConstraintComparator {
    fn category(&self) -> Category {
        Category::Constraint
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(
            Category::Constraint,
            report_columns(&["schema", "table", "constraints", "count"]),
        );

        let source_groups = group_by_table(source);
        let mut target_groups = group_by_table(target);

        report.source_count = source_groups.values().map(|g| g.total() as u64).sum();
        report.target_count = target_groups.values().map(|g| g.total() as u64).sum();

        for (key, src_group) in &source_groups {
            let tgt_group = target_groups.remove(key);
            let mut row = match &tgt_group {
                Some(tgt_group) => {
                    let mut missing_parts = Vec::new();
                    let mut extra_parts = Vec::new();
                    for kind in KIND_ORDER {
                        let src_n = src_group.count_for(kind) as i64;
                        let tgt_n = tgt_group.count_for(kind) as i64;
                        if src_n > tgt_n {
                            missing_parts.push(missing_phrase((src_n - tgt_n) as usize, kind));
                        } else if tgt_n > src_n {
                            extra_parts.push(extra_phrase((tgt_n - src_n) as usize, kind));
                        }
                    }
                    // Count inequality fails the table in either direction;
                    // missing kinds take priority in the reason.
                    if !missing_parts.is_empty() {
                        DiffRow::new(Status::plain_mismatch()).with_reason(missing_parts.join(" | "))
                    } else if !extra_parts.is_empty() {
                        DiffRow::new(Status::plain_mismatch()).with_reason(extra_parts.join(" | "))
                    } else {
                        DiffRow::new(Status::Matched)
                    }
                }
                None => DiffRow::new(Status::plain_mismatch())
                    .with_reason(format!("{} constraints missing", src_group.total())),
            };

            row.set("SOURCE_schema", &src_group.schema);
            row.set("SOURCE_table", &src_group.table);
            row.set("SOURCE_constraints", src_group.display_list());
            row.set("SOURCE_count", src_group.total().to_string());
            if let Some(tgt_group) = &tgt_group {
                row.set("TARGET_schema", &tgt_group.schema);
                row.set("TARGET_table", &tgt_group.table);
                row.set("TARGET_constraints", tgt_group.display_list());
                row.set("TARGET_count", tgt_group.total().to_string());
            }
            report.rows.push(row);
        }

        // Tables with constraints only on the TARGET side.
        for tgt_group in target_groups.values() {
            let mut row = DiffRow::new(Status::ExtraInTarget);
            row.set("TARGET_schema", &tgt_group.schema);
            row.set("TARGET_table", &tgt_group.table);
            row.set("TARGET_constraints", tgt_group.display_list());
            row.set("TARGET_count", tgt_group.total().to_string());
            report.rows.push(row);
        }

        report
    }
}

fn missing_phrase(n: usize, kind: ConstraintKind) -> String {
    if n == 1 {
        format!("1 {} is missing", kind.label())
    } else {
        format!("{n} {}s are missing", kind.label())
    }
}

fn extra_phrase(n: usize, kind: ConstraintKind) -> String {
    if n == 1 {
        format!("1 {} is extra in TARGET", kind.label())
    } else {
        format!("{n} {}s are extra in TARGET", kind.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;

    fn constraint(
        origin: Origin,
        table: &str,
        name: &str,
        kind: ConstraintKind,
    ) -> EntityRecord {
        let schema = match origin {
            Origin::Source => "dbo",
            Origin::Target => "public",
        };
        EntityRecord::new(Category::Constraint, origin, schema, name)
            .with_table(table)
            .with_attributes(Attributes::Constraint {
                kind,
                definition: None,
            })
    }

    fn compare(source: Vec<EntityRecord>, target: Vec<EntityRecord>) -> CategoryReport {
        ConstraintComparator.compare(&source, &target, &CompareContext::default())
    }

    #[test]
    fn test_equal_counts_match_despite_renamed_constraints() {
        let report = compare(
            vec![
                constraint(Origin::Source, "Orders", "PK__Orders__3214EC07", ConstraintKind::PrimaryKey),
                constraint(Origin::Source, "Orders", "FK_Orders_Customers", ConstraintKind::ForeignKey),
            ],
            vec![
                constraint(Origin::Target, "orders", "orders_pkey", ConstraintKind::PrimaryKey),
                constraint(Origin::Target, "orders", "orders_customer_id_fkey", ConstraintKind::ForeignKey),
            ],
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.source_count, 2);
        assert_eq!(report.target_count, 2);
    }

    #[test]
    fn test_missing_fk_reason_phrase() {
        let report = compare(
            vec![
                constraint(Origin::Source, "orders", "PK_Orders", ConstraintKind::PrimaryKey),
                constraint(Origin::Source, "orders", "FK_Orders_Customers", ConstraintKind::ForeignKey),
            ],
            vec![constraint(Origin::Target, "orders", "orders_pkey", ConstraintKind::PrimaryKey)],
        );

        assert_eq!(report.rows[0].status, Status::plain_mismatch());
        assert_eq!(report.rows[0].reason.as_deref(), Some("1 FK is missing"));
    }

    #[test]
    fn test_multiple_kinds_missing_joined() {
        let report = compare(
            vec![
                constraint(Origin::Source, "orders", "FK_a", ConstraintKind::ForeignKey),
                constraint(Origin::Source, "orders", "FK_b", ConstraintKind::ForeignKey),
                constraint(Origin::Source, "orders", "CK_amount", ConstraintKind::Check),
            ],
            vec![constraint(Origin::Target, "orders", "other", ConstraintKind::Other)],
        );

        assert_eq!(
            report.rows[0].reason.as_deref(),
            Some("2 FKs are missing | 1 Check is missing")
        );
    }

    #[test]
    fn test_auto_numbered_duplicate_checks_count_once() {
        // Engine-appended counters collapse to a single distinct constraint.
        let report = compare(
            vec![
                constraint(Origin::Source, "orders", "CK_amount_1", ConstraintKind::Check),
                constraint(Origin::Source, "orders", "CK_amount_2", ConstraintKind::Check),
            ],
            vec![constraint(Origin::Target, "orders", "ck_amount", ConstraintKind::Check)],
        );

        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.source_count, 1);
    }

    #[test]
    fn test_extra_constraint_kind_is_mismatch() {
        let report = compare(
            vec![constraint(Origin::Source, "orders", "FK_Orders_Customers", ConstraintKind::ForeignKey)],
            vec![
                constraint(Origin::Target, "orders", "orders_customer_id_fkey", ConstraintKind::ForeignKey),
                constraint(Origin::Target, "orders", "orders_amount_check", ConstraintKind::Check),
            ],
        );

        assert_eq!(report.rows[0].status, Status::plain_mismatch());
        assert_eq!(
            report.rows[0].reason.as_deref(),
            Some("1 Check is extra in TARGET")
        );
    }

    #[test]
    fn test_target_only_table_is_extra() {
        let report = compare(
            vec![],
            vec![constraint(Origin::Target, "audit", "audit_pkey", ConstraintKind::PrimaryKey)],
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::ExtraInTarget);
        assert_eq!(report.rows[0].get("TARGET_table"), "audit");
        assert_eq!(report.rows[0].get("SOURCE_table"), "");
    }

    #[test]
    fn test_default_and_check_on_same_column_stay_distinct() {
        let report = compare(
            vec![
                constraint(Origin::Source, "orders", "status", ConstraintKind::Default),
                constraint(Origin::Source, "orders", "CK_status", ConstraintKind::Check),
            ],
            vec![
                constraint(Origin::Target, "orders", "status", ConstraintKind::Default),
                constraint(Origin::Target, "orders", "orders_status_check", ConstraintKind::Check),
            ],
        );

        assert_eq!(report.source_count, 2);
        assert_eq!(report.target_count, 2);
        assert_eq!(report.rows[0].status, Status::Matched);
    }
}
