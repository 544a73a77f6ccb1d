//! Core reconciliation engine for dbrecon.
//!
//! This crate compares a SQL Server database (the migration source of
//! record) against its PostgreSQL migration target and classifies every
//! schema entity as matched, mismatched, missing or extra. It provides the
//! canonical record model, identifier normalization, entity matching,
//! per-category comparators, the pass/fail aggregation and the extraction
//! adapters shared by the `dbrecon` binary.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - All database operations are read-only catalog queries
//! - Connection strings are sanitized in all error messages
//!
//! # Architecture
//! - Adapter pattern for engine-specific catalog extraction
//! - Strategy pattern for per-category comparison
//! - Comprehensive error handling with credential sanitization

pub mod adapters;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod report;
pub mod summary;
pub mod typemap;

// Re-export commonly used types
pub use adapters::ExtractionAdapter;
pub use compare::{default_comparators, Comparator, CompareContext};
pub use config::ReconcileConfig;
pub use engine::{BatchReport, ConnectionFactory, DatabaseFailure, Reconciler};
pub use error::{redact_database_url, DbReconError, Result};
pub use matcher::RenameMap;
pub use models::{Attributes, Category, ConstraintKind, EntityRecord, FunctionKind, Origin};
pub use report::{CategoryReport, CategorySummary, DiffRow, RunReport, Status, Verdict};
pub use summary::summarize;
pub use typemap::TypeCompat;

#[cfg(all(feature = "mssql", feature = "postgresql"))]
pub use adapters::UrlConnectionFactory;
