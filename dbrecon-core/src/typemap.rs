//! Static type compatibility oracle for SQL Server -> PostgreSQL columns.
//!
//! Backed by an equivalence table from each SQL Server scalar type to the
//! set of PostgreSQL types an AWS SCT-style migration may produce for it.
//! The table is data, not policy: callers inject a custom table in tests.

use std::collections::BTreeMap;

/// Equivalence table between source and target scalar type names.
#[derive(Debug, Clone)]
pub struct TypeCompat {
    equivalents: BTreeMap<String, Vec<String>>,
}

impl Default for TypeCompat {
    fn default() -> Self {
        let entries: [(&str, &[&str]); 27] = [
            ("int", &["integer", "int4"]),
            ("bigint", &["bigint", "int8"]),
            ("smallint", &["smallint", "int2"]),
            ("tinyint", &["smallint", "int2", "integer"]),
            ("bit", &["boolean", "bool"]),
            ("varchar", &["character varying", "varchar", "text", "name"]),
            ("nvarchar", &["character varying", "varchar", "text", "name"]),
            ("char", &["character", "char", "name"]),
            ("nchar", &["character", "char", "name"]),
            ("text", &["text", "character varying", "name"]),
            ("ntext", &["text", "character varying", "name"]),
            (
                "datetime",
                &["timestamp", "timestamp without time zone", "timestamp with time zone"],
            ),
            (
                "datetime2",
                &["timestamp", "timestamp without time zone", "timestamp with time zone"],
            ),
            ("smalldatetime", &["timestamp", "timestamp without time zone"]),
            ("date", &["date"]),
            ("time", &["time", "time without time zone", "time with time zone"]),
            ("float", &["double precision", "float8"]),
            ("real", &["real", "float4"]),
            ("decimal", &["numeric", "decimal"]),
            ("numeric", &["numeric", "decimal"]),
            ("money", &["numeric", "decimal"]),
            ("smallmoney", &["numeric", "decimal"]),
            ("uniqueidentifier", &["uuid"]),
            ("xml", &["xml", "text"]),
            ("varbinary", &["bytea"]),
            ("binary", &["bytea"]),
            ("image", &["bytea"]),
        ];

        let mut equivalents = BTreeMap::new();
        for (source, targets) in entries {
            equivalents.insert(
                source.to_string(),
                targets.iter().map(|t| (*t).to_string()).collect(),
            );
        }
        // json/jsonb accept each other in either spelling.
        equivalents.insert("json".to_string(), vec!["json".to_string(), "jsonb".to_string()]);
        equivalents.insert("jsonb".to_string(), vec!["jsonb".to_string(), "json".to_string()]);

        Self { equivalents }
    }
}

impl TypeCompat {
    /// Builds an oracle from a custom equivalence table.
    pub fn new(equivalents: BTreeMap<String, Vec<String>>) -> Self {
        Self { equivalents }
    }

    /// Whether a source column type is acceptable as the given target type.
    ///
    /// An empty type on either side means extraction could not determine the
    /// type; it is treated as compatible rather than raising a false
    /// mismatch. Equal names are always compatible, which covers custom and
    /// extension types absent from the table.
    pub fn compatible(&self, source_type: &str, target_type: &str) -> bool {
        let source = source_type.trim().to_lowercase();
        let target = target_type.trim().to_lowercase();

        if source.is_empty() || target.is_empty() {
            return true;
        }
        if source == target {
            return true;
        }
        self.equivalents
            .get(&source)
            .is_some_and(|targets| targets.iter().any(|t| *t == target))
    }
}
