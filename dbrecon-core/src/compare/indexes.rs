//! Index comparison: grouped per table and compared by distinct index
//! counts, with decorator prefixes folded away before counting.
//!
//! PostgreSQL migrations rename indexes wholesale (`IX_Orders_CustomerId`
//! becomes `orders_customer_id_idx`), so like constraints this category
//! compares per-table counts rather than individual names.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Category, EntityRecord};
use crate::normalize::{normalize_index_name, normalize_name};
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};

pub struct IndexComparator;

#[derive(Default)]
struct TableGroup {
    schema: String,
    table: String,
    display: BTreeSet<String>,
    names: BTreeSet<String>,
}

impl TableGroup {
    fn add(&mut self, record: &EntityRecord) {
        if self.table.is_empty() {
            self.schema = record.schema.clone();
            self.table = record.table.clone();
        }
        self.display.insert(record.name.clone());
        self.names.insert(normalize_index_name(&record.name));
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

impl Comparator for IndexComparator {
    fn category(&self) -> Category {
        Category::Index
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        _ctx: &CompareContext,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(
            Category::Index,
            report_columns(&["schema", "table", "indexes", "count"]),
        );

        let source_groups = group_by_table(source);
        let mut target_groups = group_by_table(target);

        report.source_count = source_groups.values().map(|g| g.names.len() as u64).sum();
        report.target_count = target_groups.values().map(|g| g.names.len() as u64).sum();

        for (key, src_group) in &source_groups {
            let tgt_group = target_groups.remove(key);
            let src_count = src_group.names.len();
            let tgt_count = tgt_group.as_ref().map_or(0, |g| g.names.len());

            // Count inequality fails the table in either direction; EXTRA is
            // reserved for tables with no SOURCE indexes at all.
            let mut row = if src_count == tgt_count {
                DiffRow::new(Status::Matched)
            } else if src_count < tgt_count {
                DiffRow::new(Status::plain_mismatch())
                    .with_reason(format!("{} extra in TARGET", tgt_count - src_count))
            } else {
                DiffRow::new(Status::plain_mismatch())
                    .with_reason(format!("{} missing in TARGET", src_count - tgt_count))
            };

            row.set("SOURCE_schema", &src_group.schema);
            row.set("SOURCE_table", &src_group.table);
            row.set("SOURCE_indexes", src_group.display_list());
            row.set("SOURCE_count", src_count.to_string());
            if let Some(tgt_group) = &tgt_group {
                row.set("TARGET_schema", &tgt_group.schema);
                row.set("TARGET_table", &tgt_group.table);
                row.set("TARGET_indexes", tgt_group.display_list());
                row.set("TARGET_count", tgt_count.to_string());
            }
            report.rows.push(row);
        }

        for tgt_group in target_groups.values() {
            let mut row = DiffRow::new(Status::ExtraInTarget);
            row.set("TARGET_schema", &tgt_group.schema);
            row.set("TARGET_table", &tgt_group.table);
            row.set("TARGET_indexes", tgt_group.display_list());
            row.set("TARGET_count", tgt_group.names.len().to_string());
            report.rows.push(row);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, Origin};

    fn index(origin: Origin, table: &str, name: &str) -> EntityRecord {
        let schema = match origin {
            Origin::Source => "dbo",
            Origin::Target => "public",
        };
        EntityRecord::new(Category::Index, origin, schema, name)
            .with_table(table)
            .with_attributes(Attributes::Index {
                index_type: "btree".to_string(),
                columns: String::new(),
            })
    }

    fn compare(source: Vec<EntityRecord>, target: Vec<EntityRecord>) -> CategoryReport {
        IndexComparator.compare(&source, &target, &CompareContext::default())
    }

    #[test]
    fn test_renamed_indexes_match_by_count() {
        let report = compare(
            vec![
                index(Origin::Source, "Orders", "IX_Orders_CustomerId"),
                index(Origin::Source, "Orders", "PK__Orders__3214EC07"),
            ],
            vec![
                index(Origin::Target, "orders", "orders_customer_id_idx"),
                index(Origin::Target, "orders", "orders_pkey"),
            ],
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.source_count, 2);
    }

    #[test]
    fn test_fewer_target_indexes_is_mismatch() {
        let report = compare(
            vec![
                index(Origin::Source, "orders", "IX_a"),
                index(Origin::Source, "orders", "IX_b"),
            ],
            vec![index(Origin::Target, "orders", "orders_a_idx")],
        );

        assert_eq!(report.rows[0].status, Status::plain_mismatch());
        assert_eq!(report.rows[0].reason.as_deref(), Some("1 missing in TARGET"));
    }

    #[test]
    fn test_more_target_indexes_is_mismatch() {
        let report = compare(
            vec![index(Origin::Source, "orders", "IX_a")],
            vec![
                index(Origin::Target, "orders", "a_idx"),
                index(Origin::Target, "orders", "b_idx"),
            ],
        );

        assert_eq!(report.rows[0].status, Status::plain_mismatch());
        assert_eq!(report.rows[0].reason.as_deref(), Some("1 extra in TARGET"));
    }

    #[test]
    fn test_target_only_table_is_extra() {
        let report = compare(vec![], vec![index(Origin::Target, "audit", "audit_pkey")]);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::ExtraInTarget);
        assert_eq!(report.rows[0].get("TARGET_table"), "audit");
    }

    #[test]
    fn test_prefix_variants_collapse_to_one_index() {
        // IX_ and idx decorations of the same name count once per side.
        let report = compare(
            vec![index(Origin::Source, "orders", "IX_customer_id")],
            vec![index(Origin::Target, "orders", "idxcustomerid")],
        );

        assert_eq!(report.rows[0].status, Status::Matched);
    }
}
