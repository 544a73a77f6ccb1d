//! Canonical record model for extracted schema metadata.
//!
//! Every entity pulled from either database is shaped into an
//! [`EntityRecord`] regardless of the source engine, so the matcher and
//! comparators never see engine-specific row formats. Records are immutable
//! once extracted; matches and diff rows are recomputed from scratch on
//! every run.

use serde::{Deserialize, Serialize};

/// Which side of the reconciliation a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// The system of record being migrated from (SQL Server).
    Source,
    /// The migration destination (PostgreSQL).
    Target,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Source => write!(f, "source"),
            Origin::Target => write!(f, "target"),
        }
    }
}

/// Entity categories compared by the engine, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Table,
    Column,
    Constraint,
    Index,
    Trigger,
    EventTrigger,
    View,
    Function,
    Type,
    Procedure,
    RowCount,
}

impl Category {
    /// Fixed comparison order; the orchestrator iterates this list.
    pub const ALL: [Category; 11] = [
        Category::Table,
        Category::Column,
        Category::Constraint,
        Category::Index,
        Category::Trigger,
        Category::EventTrigger,
        Category::View,
        Category::Function,
        Category::Type,
        Category::Procedure,
        Category::RowCount,
    ];

    /// Sheet/section name used in rendered reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Table => "Tables",
            Category::Column => "Columns",
            Category::Constraint => "Constraints",
            Category::Index => "Indexes",
            Category::Trigger => "Triggers",
            Category::EventTrigger => "EventTriggers",
            Category::View => "Views",
            Category::Function => "Functions",
            Category::Type => "Types",
            Category::Procedure => "Procedures",
            Category::RowCount => "RowCounts",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint kinds tracked by the grouped constraint comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Check,
    Default,
    /// Unique and other constraint types outside the per-kind counts.
    Other,
}

impl ConstraintKind {
    /// Parses engine catalog constraint type strings.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "primary key" => ConstraintKind::PrimaryKey,
            "foreign key" => ConstraintKind::ForeignKey,
            "check" => ConstraintKind::Check,
            "default" => ConstraintKind::Default,
            _ => ConstraintKind::Other,
        }
    }

    /// Short label used in reason text ("1 FK is missing").
    pub fn label(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PK",
            ConstraintKind::ForeignKey => "FK",
            ConstraintKind::Check => "Check",
            ConstraintKind::Default => "Default",
            ConstraintKind::Other => "Other",
        }
    }
}

/// Whether a function is trigger-bound or a normal callable function.
///
/// PostgreSQL distinguishes trigger functions by return type; SQL Server has
/// no equivalent, so all of its functions are classified as normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Normal,
    Trigger,
}

/// Category-specific attributes carried by an [`EntityRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Attributes {
    /// Table-level entities (tables, views, procedures, plain triggers).
    #[default]
    None,
    Column {
        data_type: String,
        is_nullable: bool,
        default_value: Option<String>,
    },
    Constraint {
        kind: ConstraintKind,
        definition: Option<String>,
    },
    Index {
        index_type: String,
        /// Comma-joined column list as reported by the engine catalog.
        columns: String,
    },
    EventTrigger {
        event_type: String,
    },
    Function {
        kind: FunctionKind,
    },
    Type {
        /// composite / domain / enum / range / table / user-defined
        kind: String,
    },
    RowCount {
        /// None when the per-table count query failed and was absorbed.
        rows: Option<u64>,
    },
}

/// One row of extracted metadata, uniform across engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub schema: String,
    /// Owning table; empty for table-level entities.
    pub table: String,
    pub name: String,
    pub category: Category,
    pub origin: Origin,
    pub attributes: Attributes,
}

impl EntityRecord {
    /// Creates a table-level record with no category-specific attributes.
    pub fn new(
        category: Category,
        origin: Origin,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: String::new(),
            name: name.into(),
            category,
            origin,
            attributes: Attributes::None,
        }
    }

    /// Sets the owning table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets category-specific attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// `schema.name` as used in log output.
    pub fn fullname(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_is_stable() {
        assert_eq!(Category::ALL.first(), Some(&Category::Table));
        assert_eq!(Category::ALL.last(), Some(&Category::RowCount));
        assert_eq!(Category::ALL.len(), 11);
    }

    #[test]
    fn test_constraint_kind_parse() {
        assert_eq!(ConstraintKind::parse("PRIMARY KEY"), ConstraintKind::PrimaryKey);
        assert_eq!(ConstraintKind::parse("foreign key"), ConstraintKind::ForeignKey);
        assert_eq!(ConstraintKind::parse(" CHECK "), ConstraintKind::Check);
        assert_eq!(ConstraintKind::parse("DEFAULT"), ConstraintKind::Default);
        assert_eq!(ConstraintKind::parse("UNIQUE"), ConstraintKind::Other);
    }

    #[test]
    fn test_record_fullname() {
        let record = EntityRecord::new(Category::Table, Origin::Source, "dbo", "orders");
        assert_eq!(record.fullname(), "dbo.orders");

        let record = EntityRecord::new(Category::EventTrigger, Origin::Target, "", "audit_ddl");
        assert_eq!(record.fullname(), "audit_ddl");
    }

    #[test]
    fn test_record_builder() {
        let record = EntityRecord::new(Category::Column, Origin::Source, "dbo", "customer_id")
            .with_table("orders")
            .with_attributes(Attributes::Column {
                data_type: "int".to_string(),
                is_nullable: false,
                default_value: None,
            });

        assert_eq!(record.table, "orders");
        assert!(matches!(record.attributes, Attributes::Column { .. }));
    }
}
