//! Extraction adapters: one per database engine, all producing the same
//! canonical [`EntityRecord`] rows so the comparison pipeline never sees
//! engine-specific catalog formats.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Category, EntityRecord, Origin};

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "mssql")]
pub use mssql::MssqlAdapter;
#[cfg(feature = "postgresql")]
pub use postgres::PostgresAdapter;

/// Engine-agnostic schema metadata extraction.
///
/// One adapter instance is bound to one open database connection. Extraction
/// is read-only; adapters never issue DDL or DML.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// Which side of the reconciliation this adapter feeds.
    fn origin(&self) -> Origin;

    /// Extracts all records for one category.
    ///
    /// A failed catalog query fails the whole category (and with it the
    /// current database's run). The one exception is per-table row counts,
    /// where a single unreadable table is absorbed as an unknown count so
    /// one broken view cannot sink the entire report.
    async fn extract(&self, category: Category) -> Result<Vec<EntityRecord>>;
}

/// Opens SQL Server source / PostgreSQL target connections from base URLs,
/// appending the per-batch database name.
#[cfg(all(feature = "mssql", feature = "postgresql"))]
pub struct UrlConnectionFactory {
    source_url: String,
    target_url: String,
    excluded_schemas: Vec<String>,
}

#[cfg(all(feature = "mssql", feature = "postgresql"))]
impl UrlConnectionFactory {
    pub fn new(
        source_url: impl Into<String>,
        target_url: impl Into<String>,
        excluded_schemas: Vec<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            target_url: target_url.into(),
            excluded_schemas,
        }
    }
}

#[cfg(all(feature = "mssql", feature = "postgresql"))]
#[async_trait]
impl crate::engine::ConnectionFactory for UrlConnectionFactory {
    async fn open_source(&self, database: &str) -> Result<Box<dyn ExtractionAdapter>> {
        let adapter =
            MssqlAdapter::connect(&self.source_url, database, self.excluded_schemas.clone())
                .await?;
        Ok(Box::new(adapter))
    }

    async fn open_target(&self, database: &str) -> Result<Box<dyn ExtractionAdapter>> {
        let url = format!("{}/{}", self.target_url.trim_end_matches('/'), database);
        let adapter = PostgresAdapter::connect(&url, self.excluded_schemas.clone()).await?;
        Ok(Box::new(adapter))
    }
}
