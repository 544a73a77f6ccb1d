//! Category comparison strategies.
//!
//! One comparator per entity category, each deciding what "matched" means
//! for that category and producing the category's diff rows. The engine
//! iterates a fixed ordered list of registered comparators instead of
//! branching on category names, so adding a category is a registration
//! change, not an orchestrator change.
//!
//! Every comparator upholds the same row contract: each SOURCE and each
//! TARGET record lands in exactly one diff row: matched pairs and missing
//! SOURCE entities first, in SOURCE order, then unmatched TARGET entities.
//! (The rename-map suppression rule for procedures and event triggers is the
//! single documented exception on the TARGET side.)

mod columns;
mod constraints;
mod functions;
mod indexes;
mod mapped;
mod named;
mod row_counts;
mod triggers;
mod types;

pub use columns::ColumnComparator;
pub use constraints::ConstraintComparator;
pub use functions::FunctionComparator;
pub use indexes::IndexComparator;
pub use mapped::MappedComparator;
pub use named::NamedEntityComparator;
pub use row_counts::RowCountComparator;
pub use triggers::TriggerComparator;
pub use types::TypeComparator;

use crate::matcher::RenameMap;
use crate::models::{Category, EntityRecord};
use crate::report::CategoryReport;
use crate::typemap::TypeCompat;

/// Injected collaborators shared by all comparators.
///
/// Owned by a single reconciliation run; the per-category claimed-target
/// state lives inside each `compare` invocation and is never shared.
#[derive(Debug, Clone, Default)]
pub struct CompareContext {
    pub types: TypeCompat,
    pub procedure_renames: RenameMap,
    pub event_trigger_renames: RenameMap,
}

/// Strategy for comparing one entity category.
pub trait Comparator: Send + Sync {
    /// The category this comparator handles.
    fn category(&self) -> Category;

    /// Produces the category's diff rows from freshly extracted records.
    fn compare(
        &self,
        source: &[EntityRecord],
        target: &[EntityRecord],
        ctx: &CompareContext,
    ) -> CategoryReport;
}

/// The full comparator set in report order.
pub fn default_comparators() -> Vec<Box<dyn Comparator>> {
    vec![
        Box::new(NamedEntityComparator::new(Category::Table)),
        Box::new(ColumnComparator),
        Box::new(ConstraintComparator),
        Box::new(IndexComparator),
        Box::new(TriggerComparator),
        Box::new(MappedComparator::event_triggers()),
        Box::new(NamedEntityComparator::new(Category::View)),
        Box::new(FunctionComparator),
        Box::new(TypeComparator),
        Box::new(MappedComparator::procedures()),
        Box::new(RowCountComparator),
    ]
}

/// Builds the ordered output column list: `SOURCE_*` fields, the same
/// fields as `TARGET_*`, then `Reason` and `Status` last.
pub(crate) fn report_columns(fields: &[&str]) -> Vec<String> {
    let mut columns: Vec<String> = fields.iter().map(|f| format!("SOURCE_{f}")).collect();
    columns.extend(fields.iter().map(|f| format!("TARGET_{f}")));
    columns.push("Reason".to_string());
    columns.push("Status".to_string());
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_comparators_cover_every_category_in_order() {
        let comparators = default_comparators();
        let categories: Vec<Category> = comparators.iter().map(|c| c.category()).collect();
        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[test]
    fn test_report_columns_order_contract() {
        let columns = report_columns(&["schema", "name"]);
        assert_eq!(
            columns,
            vec![
                "SOURCE_schema",
                "SOURCE_name",
                "TARGET_schema",
                "TARGET_name",
                "Reason",
                "Status"
            ]
        );
    }
}
