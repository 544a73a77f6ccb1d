//! PostgreSQL extraction adapter (TARGET side) built on sqlx.
//!
//! # Security Guarantees
//! - All operations are read-only catalog queries
//! - Connection strings are sanitized in error messages
//!
//! Uses `information_schema` where a view exists for the category and
//! `pg_catalog` (pg_indexes, pg_event_trigger, pg_type) where it does not.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::warn;

use super::ExtractionAdapter;
use crate::error::{redact_database_url, DbReconError, Result};
use crate::models::{Attributes, Category, ConstraintKind, EntityRecord, FunctionKind, Origin};
use crate::normalize::normalize_name;

/// PostgreSQL schema extraction over a small connection pool.
pub struct PostgresAdapter {
    pool: PgPool,
    database: String,
    excluded_schemas: Vec<String>,
}

impl PostgresAdapter {
    /// Connects to one PostgreSQL database.
    ///
    /// # Arguments
    /// * `url` - full connection URL including the database path
    ///   (credentials sanitized in errors)
    /// * `excluded_schemas` - schemas skipped during extraction
    pub async fn connect(url: &str, excluded_schemas: Vec<String>) -> Result<Self> {
        let database = url::Url::parse(url)
            .ok()
            .map(|u| u.path().trim_start_matches('/').to_string())
            .unwrap_or_default();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await
            .map_err(|e| DbReconError::Connection {
                database: database.clone(),
                context: format!("unable to open {}", redact_database_url(url)),
                source: Box::new(e),
            })?;

        Ok(Self {
            pool,
            database,
            excluded_schemas: excluded_schemas
                .iter()
                .map(|s| normalize_name(s))
                .collect(),
        })
    }

    fn is_excluded(&self, schema: &str) -> bool {
        self.excluded_schemas.contains(&normalize_name(schema))
    }

    async fn query_rows(
        &self,
        sql: &str,
        category: Category,
    ) -> Result<Vec<sqlx::postgres::PgRow>> {
        sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbReconError::extraction_failed(category, "catalog query failed", e))
    }

    async fn extract_tables(&self, category: Category) -> Result<Vec<EntityRecord>> {
        let sql = match category {
            Category::View => {
                "SELECT table_schema, table_name FROM information_schema.views \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema')"
            }
            _ => {
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_type = 'BASE TABLE' \
                 AND table_schema NOT IN ('pg_catalog', 'information_schema')"
            }
        };
        let rows = self.query_rows(sql, category).await?;
        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("table_schema"),
                    row.get::<String, _>("table_name"),
                )
            })
            .filter(|(schema, _)| !self.is_excluded(schema))
            .map(|(schema, name)| EntityRecord::new(category, Origin::Target, schema, name))
            .collect())
    }

    async fn extract_columns(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT table_schema, table_name, column_name, data_type, is_nullable, \
                   column_default FROM information_schema.columns \
                   WHERE table_schema NOT IN ('pg_catalog', 'information_schema')";
        let rows = self.query_rows(sql, Category::Column).await?;
        Ok(rows
            .iter()
            .filter(|row| !self.is_excluded(&row.get::<String, _>("table_schema")))
            .map(|row| {
                EntityRecord::new(
                    Category::Column,
                    Origin::Target,
                    row.get::<String, _>("table_schema"),
                    row.get::<String, _>("column_name"),
                )
                .with_table(row.get::<String, _>("table_name"))
                .with_attributes(Attributes::Column {
                    data_type: row.get::<String, _>("data_type"),
                    is_nullable: row
                        .get::<String, _>("is_nullable")
                        .eq_ignore_ascii_case("YES"),
                    default_value: row.get::<Option<String>, _>("column_default"),
                })
            })
            .collect())
    }

    /// Table constraints (which on PostgreSQL already include NOT NULL rows
    /// as CHECK constraints) plus column defaults, synthesized as constraint
    /// records named after their column.
    async fn extract_constraints(&self) -> Result<Vec<EntityRecord>> {
        let mut records = Vec::new();

        let sql = "SELECT tc.table_schema, tc.table_name, tc.constraint_name, \
                   tc.constraint_type FROM information_schema.table_constraints tc \
                   WHERE tc.table_schema NOT IN ('pg_catalog', 'information_schema')";
        for row in self.query_rows(sql, Category::Constraint).await? {
            let schema: String = row.get("table_schema");
            if self.is_excluded(&schema) {
                continue;
            }
            records.push(
                EntityRecord::new(
                    Category::Constraint,
                    Origin::Target,
                    schema,
                    row.get::<String, _>("constraint_name"),
                )
                .with_table(row.get::<String, _>("table_name"))
                .with_attributes(Attributes::Constraint {
                    kind: ConstraintKind::parse(&row.get::<String, _>("constraint_type")),
                    definition: None,
                }),
            );
        }

        let sql = "SELECT table_schema, table_name, column_name, column_default \
                   FROM information_schema.columns WHERE column_default IS NOT NULL \
                   AND table_schema NOT IN ('pg_catalog', 'information_schema')";
        for row in self.query_rows(sql, Category::Constraint).await? {
            let schema: String = row.get("table_schema");
            if self.is_excluded(&schema) {
                continue;
            }
            let column: String = row.get("column_name");
            let default: String = row.get("column_default");
            records.push(
                EntityRecord::new(Category::Constraint, Origin::Target, schema, &column)
                    .with_table(row.get::<String, _>("table_name"))
                    .with_attributes(Attributes::Constraint {
                        kind: ConstraintKind::Default,
                        definition: Some(format!("DEFAULT ({default}) FOR {column}")),
                    }),
            );
        }

        Ok(records)
    }

    async fn extract_indexes(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT schemaname, tablename, indexname, indexdef FROM pg_indexes \
                   WHERE schemaname NOT IN ('pg_catalog', 'information_schema')";
        let rows = self.query_rows(sql, Category::Index).await?;
        let mut records = Vec::new();
        for row in rows {
            let schema: String = row.get("schemaname");
            if self.is_excluded(&schema) {
                continue;
            }
            let name: String = row.get("indexname");
            let definition: String = row.get("indexdef");
            // Primary key indexes surface through the constraint category.
            if definition.to_lowercase().contains("primary key")
                || normalize_name(&name).starts_with("pk")
            {
                continue;
            }
            let index_type = if definition.to_lowercase().contains("unique") {
                "UNIQUE"
            } else {
                "INDEX"
            };
            records.push(
                EntityRecord::new(Category::Index, Origin::Target, schema, name)
                    .with_table(row.get::<String, _>("tablename"))
                    .with_attributes(Attributes::Index {
                        index_type: index_type.to_string(),
                        columns: columns_from_indexdef(&definition),
                    }),
            );
        }
        Ok(records)
    }

    async fn extract_triggers(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT DISTINCT event_object_schema, event_object_table, trigger_name \
                   FROM information_schema.triggers \
                   WHERE event_object_schema NOT IN ('pg_catalog', 'information_schema')";
        let rows = self.query_rows(sql, Category::Trigger).await?;
        Ok(rows
            .iter()
            .filter(|row| !self.is_excluded(&row.get::<String, _>("event_object_schema")))
            .map(|row| {
                EntityRecord::new(
                    Category::Trigger,
                    Origin::Target,
                    row.get::<String, _>("event_object_schema"),
                    row.get::<String, _>("trigger_name"),
                )
                .with_table(row.get::<String, _>("event_object_table"))
            })
            .collect())
    }

    async fn extract_event_triggers(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT evtname FROM pg_event_trigger";
        let rows = self.query_rows(sql, Category::EventTrigger).await?;
        Ok(rows
            .iter()
            .map(|row| {
                EntityRecord::new(
                    Category::EventTrigger,
                    Origin::Target,
                    "",
                    row.get::<String, _>("evtname"),
                )
                .with_attributes(Attributes::EventTrigger {
                    event_type: "event_trigger".to_string(),
                })
            })
            .collect())
    }

    async fn extract_functions(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT routine_schema, routine_name, data_type \
                   FROM information_schema.routines \
                   WHERE routine_type = 'FUNCTION' \
                   AND routine_schema NOT IN ('pg_catalog', 'information_schema')";
        let rows = self.query_rows(sql, Category::Function).await?;
        Ok(rows
            .iter()
            .filter(|row| !self.is_excluded(&row.get::<String, _>("routine_schema")))
            .map(|row| {
                let data_type: Option<String> = row.get("data_type");
                let kind = match data_type.as_deref().map(str::to_lowercase).as_deref() {
                    Some("trigger") | Some("event_trigger") => FunctionKind::Trigger,
                    _ => FunctionKind::Normal,
                };
                EntityRecord::new(
                    Category::Function,
                    Origin::Target,
                    row.get::<String, _>("routine_schema"),
                    row.get::<String, _>("routine_name"),
                )
                .with_attributes(Attributes::Function { kind })
            })
            .collect())
    }

    async fn extract_types(&self) -> Result<Vec<EntityRecord>> {
        // Composite rows backing ordinary relations are excluded; only
        // standalone user-defined types are reconcilable entities.
        let sql = "SELECT n.nspname AS schema, t.typname AS type_name, \
                   CASE t.typtype \
                        WHEN 'c' THEN 'composite' \
                        WHEN 'd' THEN 'domain' \
                        WHEN 'e' THEN 'enum' \
                        WHEN 'r' THEN 'range' \
                   END AS type_kind \
                   FROM pg_type t \
                   JOIN pg_namespace n ON n.oid = t.typnamespace \
                   WHERE n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
                     AND t.typtype IN ('c', 'd', 'e', 'r') \
                     AND (t.typrelid = 0 OR NOT EXISTS ( \
                           SELECT 1 FROM pg_class c \
                           WHERE c.oid = t.typrelid AND c.relkind IN ('r', 'v', 'm'))) \
                   ORDER BY t.typname";
        let rows = self.query_rows(sql, Category::Type).await?;
        Ok(rows
            .iter()
            .filter(|row| !self.is_excluded(&row.get::<String, _>("schema")))
            .map(|row| {
                EntityRecord::new(
                    Category::Type,
                    Origin::Target,
                    row.get::<String, _>("schema"),
                    row.get::<String, _>("type_name"),
                )
                .with_attributes(Attributes::Type {
                    kind: row.get::<Option<String>, _>("type_kind").unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn extract_procedures(&self) -> Result<Vec<EntityRecord>> {
        let sql = "SELECT routine_schema, routine_name FROM information_schema.routines \
                   WHERE routine_type = 'PROCEDURE' \
                   AND routine_schema NOT IN ('pg_catalog', 'information_schema')";
        let rows = self.query_rows(sql, Category::Procedure).await?;
        Ok(rows
            .iter()
            .filter(|row| !self.is_excluded(&row.get::<String, _>("routine_schema")))
            .map(|row| {
                EntityRecord::new(
                    Category::Procedure,
                    Origin::Target,
                    row.get::<String, _>("routine_schema"),
                    row.get::<String, _>("routine_name"),
                )
            })
            .collect())
    }

    async fn extract_row_counts(&self) -> Result<Vec<EntityRecord>> {
        let tables = self.extract_tables(Category::RowCount).await?;
        let mut records = Vec::with_capacity(tables.len());
        for table in tables {
            let sql = format!(
                "SELECT COUNT(*) FROM \"{}\".\"{}\"",
                table.schema, table.name
            );
            let rows = match sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await {
                Ok(count) => u64::try_from(count).ok(),
                Err(e) => {
                    warn!(
                        database = %self.database,
                        table = %table.fullname(),
                        error = %e,
                        "row count failed; recording unknown count"
                    );
                    None
                }
            };
            records.push(table.with_attributes(Attributes::RowCount { rows }));
        }
        Ok(records)
    }
}

/// First parenthesized group of an index definition, whitespace removed:
/// `CREATE INDEX x ON t USING btree (a, b)` yields `a,b`.
fn columns_from_indexdef(definition: &str) -> String {
    let Some(start) = definition.find('(') else {
        return String::new();
    };
    let Some(len) = definition[start + 1..].find(')') else {
        return String::new();
    };
    definition[start + 1..start + 1 + len]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[async_trait]
impl ExtractionAdapter for PostgresAdapter {
    fn origin(&self) -> Origin {
        Origin::Target
    }

    async fn extract(&self, category: Category) -> Result<Vec<EntityRecord>> {
        match category {
            Category::Table | Category::View => self.extract_tables(category).await,
            Category::Column => self.extract_columns().await,
            Category::Constraint => self.extract_constraints().await,
            Category::Index => self.extract_indexes().await,
            Category::Trigger => self.extract_triggers().await,
            Category::EventTrigger => self.extract_event_triggers().await,
            Category::Function => self.extract_functions().await,
            Category::Type => self.extract_types().await,
            Category::Procedure => self.extract_procedures().await,
            Category::RowCount => self.extract_row_counts().await,
        }
    }
}
