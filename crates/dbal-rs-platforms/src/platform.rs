//! The platform contract.
//!
//! A [`Platform`] answers schema questions about one database: which tables
//! exist, what their columns and foreign keys look like, and which
//! sequence feeds a primary key. Every backend implements it, and so does
//! [`CachedPlatform`](crate::cached::CachedPlatform), which memoizes another
//! platform's answers.

use std::collections::HashMap;

use dbal_rs_core::DbalResult;

use crate::data::{Column, ForeignKey, Table};
use crate::feature::Feature;

/// Schema reflection for one database backend.
///
/// All reflection methods are async because they query the server.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Returns the platform name (`mysql` or `pgsql`).
    fn name(&self) -> &str;

    /// Returns the tables and views of `schema`, keyed by qualified name.
    ///
    /// `None` means the connection's current schema.
    async fn get_tables(&self, schema: Option<&str>) -> DbalResult<HashMap<String, Table>>;

    /// Returns the columns of `table`, keyed by column name.
    ///
    /// `table` may be qualified as `schema.table`.
    async fn get_columns(&self, table: &str) -> DbalResult<HashMap<String, Column>>;

    /// Returns the foreign keys of `table`, keyed by referencing column.
    async fn get_foreign_keys(&self, table: &str) -> DbalResult<HashMap<String, ForeignKey>>;

    /// Returns the sequence feeding the primary key of `table`, if any.
    async fn get_primary_sequence_name(&self, table: &str) -> DbalResult<Option<String>>;

    /// Returns `true` if the platform supports `feature`.
    fn is_supported(&self, feature: Feature) -> bool;
}
