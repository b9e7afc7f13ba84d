//! Sqlsage Schema — SQLite introspection and read-only execution
//!
//! This crate is the workflow's window onto the relational store:
//! - `SchemaStore`: pooled SQLite access with `list_tables`, `table_info`,
//!   `sample_values`, `plan` (EXPLAIN QUERY PLAN, no rows) and `run`
//! - `SchemaProfile`: per-table annotated DDL plus the text corpus the
//!   relevance ranker scores questions against
//!
//! The store is strictly read-only; seeding and migrations belong to callers
//! with their own connections.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod profile;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use profile::{SchemaProfile, TableProfile};
pub use store::SchemaStore;
pub use types::{ColumnInfo, ForeignKey, ResultSet, TableInfo};
