//! Rename-map driven comparison for procedures and DDL/event triggers.
//!
//! PostgreSQL's 63-character identifier limit forces renames during
//! migration, so these categories consult a hand-maintained rename map
//! before falling back to exact name matching. TARGET entities that appear
//! in any mapped value list are suppressed from the extras, even when
//! unmatched in this run, so a stale map entry never raises a false extra.

use crate::models::{Attributes, Category, EntityRecord};
use crate::normalize::normalize_name;
use crate::report::{CategoryReport, DiffRow, Status};

use super::{report_columns, Comparator, CompareContext};
use crate::matcher::RenameMap;

/// Shared comparator for the two rename-mapped categories.
pub struct MappedComparator {
    category: Category,
    /// Lowercase noun used in reason text.
    noun: &'static str,
    with_event_type: bool,
}

impl MappedComparator {
    pub fn procedures() -> Self {
        Self {
            category: Category::Procedure,
            noun: "procedure",
            with_event_type: false,
        }
    }

    pub fn event_triggers() -> Self {
        Self {
            category: Category::EventTrigger,
            noun: "event trigger",
            with_event_type: true,
        }
    }

    fn renames<'a>(&self, ctx: &'a CompareContext) -> &'a RenameMap {
        match self.category {
            Category::EventTrigger => &ctx.event_trigger_renames,
            _ => &ctx.procedure_renames,
        }
    }

    fn fill_cells(&self, row: &mut DiffRow, prefix: &str, record: &EntityRecord) {
        row.set(&format!("{prefix}_name"), &record.name);
        if self.with_event_type {
            let event_type = match &record.attributes {
                Attributes::EventTrigger { event_type } => event_type.as_str(),
                _ => "",
            };
            row.set(&format!("{prefix}_event_type"), event_type);
        }
    }
}

impl Comparator for MappedComparator {
    fn category(&self) -> Category {
        self.category
    }

    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        ctx: &CompareContext,
    ) -> CategoryReport {
        let fields: &[&str] = if self.with_event_type {
            &["name", "event_type"]
        } else {
            &["name"]
        };
        let mut report = CategoryReport::new(self.category, report_columns(fields));
        report.source_count = source.len() as u64;
        report.target_count = target.len() as u64;

        let renames = self.renames(ctx);
        let mut claimed = vec![false; target.len()];

        for src in source {
            let mut row = if let Some(mapped) = renames.targets_for(&src.name) {
                // Rename map wins over name matching. Every mapped name can
                // claim one target; the row matches when at least one did.
                let mut found: Vec<&EntityRecord> = Vec::new();
                for mapped_name in mapped {
                    let needle = normalize_name(mapped_name);
                    let hit = target.iter().enumerate().find(|(i, tgt)| {
                        !claimed[*i] && normalize_name(&tgt.name) == needle
                    });
                    if let Some((i, tgt)) = hit {
                        claimed[i] = true;
                        found.push(tgt);
                    }
                }
                if found.is_empty() {
                    let mut row = DiffRow::new(Status::MissingInTarget)
                        .with_reason(format!("Mapped PG {}(s) not found", self.noun));
                    row.set("TARGET_name", mapped.join(", "));
                    row
                } else {
                    let mut row =
                        DiffRow::new(Status::Matched).with_reason("Mapped and found in PG");
                    row.set(
                        "TARGET_name",
                        found
                            .iter()
                            .map(|t| t.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    );
                    if self.with_event_type {
                        if let Some(Attributes::EventTrigger { event_type }) =
                            found.first().map(|t| &t.attributes)
                        {
                            row.set("TARGET_event_type", event_type.as_str());
                        }
                    }
                    row
                }
            } else {
                let needle = normalize_name(&src.name);
                let hit = target.iter().enumerate().find(|(i, tgt)| {
                    !claimed[*i] && normalize_name(&tgt.name) == needle
                });
                match hit {
                    Some((i, tgt)) => {
                        claimed[i] = true;
                        let mut row = DiffRow::new(Status::Matched).with_reason("Direct name match");
                        self.fill_cells(&mut row, "TARGET", tgt);
                        row
                    }
                    None => DiffRow::new(Status::MissingInTarget)
                        .with_reason(format!("No matching {} in PG", self.noun)),
                }
            };
            self.fill_cells(&mut row, "SOURCE", src);
            report.rows.push(row);
        }

        for (tgt, claimed) in target.iter().zip(&claimed) {
            if *claimed {
                continue;
            }
            // Suppress unmatched targets a stale map entry still points at.
            if renames.is_mapped_target(&tgt.name) {
                continue;
            }
            let mut row = DiffRow::new(Status::ExtraInTarget)
                .with_reason(format!("Extra {} in PG", self.noun));
            self.fill_cells(&mut row, "TARGET", tgt);
            report.rows.push(row);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;
    use std::collections::BTreeMap;

    fn procedure(origin: Origin, name: &str) -> EntityRecord {
        let schema = match origin {
            Origin::Source => "dbo",
            Origin::Target => "public",
        };
        EntityRecord::new(Category::Procedure, origin, schema, name)
    }

    fn ctx_with_procedure_map(entries: &[(&str, &[&str])]) -> CompareContext {
        let mut map = BTreeMap::new();
        for (source, targets) in entries {
            map.insert(
                (*source).to_string(),
                targets.iter().map(|t| (*t).to_string()).collect(),
            );
        }
        CompareContext {
            procedure_renames: RenameMap::new(map),
            ..CompareContext::default()
        }
    }

    #[test]
    fn test_mapped_and_found() {
        let ctx = ctx_with_procedure_map(&[(
            "usp_RecalculateAllCustomerBalances",
            &["usp_recalc_customer_balances"],
        )]);
        let report = MappedComparator::procedures().compare(
            &[procedure(Origin::Source, "usp_RecalculateAllCustomerBalances")],
            &[procedure(Origin::Target, "usp_recalc_customer_balances")],
            &ctx,
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.rows[0].reason.as_deref(), Some("Mapped and found in PG"));
        assert_eq!(report.rows[0].get("TARGET_name"), "usp_recalc_customer_balances");
    }

    #[test]
    fn test_mapped_but_not_found() {
        let ctx = ctx_with_procedure_map(&[("usp_Old", &["usp_renamed"])]);
        let report = MappedComparator::procedures().compare(
            &[procedure(Origin::Source, "usp_Old")],
            &[],
            &ctx,
        );

        assert_eq!(report.rows[0].status, Status::MissingInTarget);
        assert_eq!(
            report.rows[0].reason.as_deref(),
            Some("Mapped PG procedure(s) not found")
        );
        assert_eq!(report.rows[0].get("TARGET_name"), "usp_renamed");
    }

    #[test]
    fn test_direct_name_match_without_map() {
        let report = MappedComparator::procedures().compare(
            &[procedure(Origin::Source, "usp_Nightly")],
            &[procedure(Origin::Target, "usp_nightly")],
            &CompareContext::default(),
        );

        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.rows[0].reason.as_deref(), Some("Direct name match"));
    }

    #[test]
    fn test_unmapped_source_missing() {
        let report = MappedComparator::procedures().compare(
            &[procedure(Origin::Source, "usp_Gone")],
            &[],
            &CompareContext::default(),
        );

        assert_eq!(report.rows[0].status, Status::MissingInTarget);
        assert_eq!(report.rows[0].reason.as_deref(), Some("No matching procedure in PG"));
    }

    #[test]
    fn test_mapped_target_suppressed_from_extras() {
        // The map still lists usp_renamed, but this run's SOURCE no longer
        // has the entry's key. The target must not surface as extra.
        let ctx = ctx_with_procedure_map(&[("usp_Old", &["usp_renamed"])]);
        let report = MappedComparator::procedures().compare(
            &[],
            &[
                procedure(Origin::Target, "usp_renamed"),
                procedure(Origin::Target, "usp_truly_extra"),
            ],
            &ctx,
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::ExtraInTarget);
        assert_eq!(report.rows[0].get("TARGET_name"), "usp_truly_extra");
        assert_eq!(report.rows[0].reason.as_deref(), Some("Extra procedure in PG"));
    }

    #[test]
    fn test_one_to_many_mapping_claims_all_listed_targets() {
        let ctx = ctx_with_procedure_map(&[("usp_Batch", &["usp_batch_a", "usp_batch_b"])]);
        let report = MappedComparator::procedures().compare(
            &[procedure(Origin::Source, "usp_Batch")],
            &[
                procedure(Origin::Target, "usp_batch_a"),
                procedure(Origin::Target, "usp_batch_b"),
            ],
            &ctx,
        );

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::Matched);
        assert_eq!(report.rows[0].get("TARGET_name"), "usp_batch_a, usp_batch_b");
    }

    #[test]
    fn test_event_trigger_reason_wording() {
        let mut map = BTreeMap::new();
        map.insert("trg_ddl_audit".to_string(), vec!["audit_ddl".to_string()]);
        let ctx = CompareContext {
            event_trigger_renames: RenameMap::new(map),
            ..CompareContext::default()
        };

        let source = EntityRecord::new(Category::EventTrigger, Origin::Source, "", "trg_ddl_audit")
            .with_attributes(Attributes::EventTrigger {
                event_type: "trigger".to_string(),
            });
        let report = MappedComparator::event_triggers().compare(&[source], &[], &ctx);

        assert_eq!(report.rows[0].status, Status::MissingInTarget);
        assert_eq!(
            report.rows[0].reason.as_deref(),
            Some("Mapped PG event trigger(s) not found")
        );
    }
}
