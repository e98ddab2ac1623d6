//! Connections and the query log.
//!
//! [`Connection`] wraps a [`Driver`], materializes each result through the
//! driver's normalizers, and records every statement in a bounded
//! [`QueryLog`]. The log is what an inspection panel reads; it never
//! influences query execution.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::Instrument;

use dbal_rs_core::logging::connection_span;
use dbal_rs_core::{DbalResult, Settings};

use crate::driver::Driver;
use crate::result::ResultSet;
use crate::value::Value;

/// One executed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryLogEntry {
    /// The alias of the connection that ran the statement.
    pub connection: String,
    /// The SQL text.
    pub sql: String,
    /// Wall-clock time spent in the driver and in normalization.
    pub time_taken: Duration,
    /// Rows returned, or `None` if the statement failed.
    pub row_count: Option<u64>,
}

/// The most recent statements run on a connection.
#[derive(Debug)]
pub struct QueryLog {
    capacity: usize,
    entries: RwLock<VecDeque<QueryLogEntry>>,
}

impl QueryLog {
    /// Creates a log keeping at most `capacity` entries. Zero disables it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Returns the maximum number of entries kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an entry, dropping the oldest one when full.
    pub async fn record(&self, entry: QueryLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write().await;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns a snapshot of the entries, oldest first.
    pub async fn entries(&self) -> Vec<QueryLogEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Returns the number of entries currently kept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// A named database connection.
pub struct Connection {
    alias: String,
    driver: Arc<dyn Driver>,
    log: QueryLog,
    span: tracing::Span,
}

impl Connection {
    /// Creates a connection with a query log of `query_log_size` entries.
    pub fn new(alias: impl Into<String>, driver: Arc<dyn Driver>, query_log_size: usize) -> Self {
        let alias = alias.into();
        let span = connection_span(&alias, driver.name());
        Self {
            alias,
            driver,
            log: QueryLog::new(query_log_size),
            span,
        }
    }

    /// Creates a connection sized by `settings.query_log_size`.
    pub fn from_settings(
        alias: impl Into<String>,
        driver: Arc<dyn Driver>,
        settings: &Settings,
    ) -> Self {
        Self::new(alias, driver, settings.query_log_size)
    }

    /// Returns the connection alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the engine name reported by the driver.
    pub fn engine(&self) -> &str {
        self.driver.name()
    }

    /// Returns the underlying driver.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Returns the query log.
    pub const fn query_log(&self) -> &QueryLog {
        &self.log
    }

    /// Executes a statement and returns its normalized rows.
    ///
    /// The statement is logged whether or not it succeeds.
    pub async fn query(&self, sql: &str, params: &[Value]) -> DbalResult<ResultSet> {
        let start = Instant::now();
        let result = self.run(sql, params).instrument(self.span.clone()).await;
        let time_taken = start.elapsed();
        let row_count = result.as_ref().ok().map(|rows| rows.len() as u64);

        let elapsed_ms = time_taken.as_secs_f64() * 1000.0;
        self.span.in_scope(|| match &result {
            Ok(_) => tracing::debug!(sql, elapsed_ms, rows = row_count, "query executed"),
            Err(e) => tracing::debug!(sql, elapsed_ms, error = %e, "query failed"),
        });

        self.log
            .record(QueryLogEntry {
                connection: self.alias.clone(),
                sql: sql.to_string(),
                time_taken,
                row_count,
            })
            .await;
        result
    }

    /// Executes a statement and returns the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> DbalResult<u64> {
        self.query(sql, params).await?;
        Ok(self.driver.affected_rows())
    }

    async fn run(&self, sql: &str, params: &[Value]) -> DbalResult<ResultSet> {
        let raw = self.driver.query(sql, params).await?;
        let normalizers = self.driver.resolve_normalizers(&raw.column_types());
        ResultSet::from_raw(raw, &normalizers)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("alias", &self.alias)
            .field("engine", &self.driver.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDriver;
    use crate::mysql::MysqlResultNormalizerFactory;
    use crate::result::{ColumnTypeDescriptor, RawResult};
    use dbal_rs_core::{DbalError, TimeZones};

    fn connection(log_size: usize) -> Connection {
        let driver = MemoryDriver::new("mysql", MysqlResultNormalizerFactory::new(TimeZones::default()))
            .respond_to(
                "FROM books",
                RawResult::new(vec![
                    ColumnTypeDescriptor::new("id", "LONG"),
                    ColumnTypeDescriptor::new("title", "VAR_STRING"),
                ])
                .with_row([Some("1"), Some("Dune")])
                .with_row([Some("2"), Some("Emma")]),
            )
            .respond_to(
                "FROM clocks",
                RawResult::new(vec![ColumnTypeDescriptor::new("t", "TIME")])
                    .with_row([Some("not a time")]),
            );
        Connection::new("default", Arc::new(driver), log_size)
    }

    #[tokio::test]
    async fn test_query_normalizes() {
        let conn = connection(10);
        let rows = conn.query("SELECT * FROM books", &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1].get("id").unwrap(), &Value::Int(2));
        assert_eq!(conn.engine(), "mysql");
        assert_eq!(conn.alias(), "default");
    }

    #[tokio::test]
    async fn test_query_is_logged() {
        let conn = connection(10);
        conn.query("SELECT * FROM books", &[]).await.unwrap();
        let entries = conn.query_log().entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].connection, "default");
        assert_eq!(entries[0].sql, "SELECT * FROM books");
        assert_eq!(entries[0].row_count, Some(2));
    }

    #[tokio::test]
    async fn test_failed_query_is_logged_without_row_count() {
        let conn = connection(10);
        let err = conn.query("SELECT t FROM clocks", &[]).await.unwrap_err();
        assert!(matches!(err, DbalError::InvalidTimeFormat { .. }));
        let entries = conn.query_log().entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].row_count, None);
    }

    #[tokio::test]
    async fn test_log_keeps_most_recent() {
        let conn = connection(2);
        for n in 0..3 {
            conn.query(&format!("SELECT {n} FROM books"), &[]).await.unwrap();
        }
        let sql: Vec<String> = conn
            .query_log()
            .entries()
            .await
            .into_iter()
            .map(|e| e.sql)
            .collect();
        assert_eq!(sql, vec!["SELECT 1 FROM books", "SELECT 2 FROM books"]);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_log() {
        let conn = connection(0);
        conn.query("SELECT * FROM books", &[]).await.unwrap();
        assert!(conn.query_log().is_empty().await);
    }

    #[tokio::test]
    async fn test_execute_returns_affected_rows() {
        let conn = connection(1);
        assert_eq!(conn.execute("DELETE FROM books", &[]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_settings_uses_query_log_size() {
        let mut settings = Settings::default();
        settings.query_log_size = 7;
        let driver = MemoryDriver::new("mysql", MysqlResultNormalizerFactory::new(TimeZones::default()));
        let conn = Connection::from_settings("default", Arc::new(driver), &settings);
        assert_eq!(conn.query_log().capacity(), 7);
    }
}
