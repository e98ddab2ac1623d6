//! An in-memory [`Driver`] that answers queries with canned results.
//!
//! Responses are registered against a SQL fragment; the first registered
//! fragment contained in an executed statement decides the answer. Every
//! executed statement is recorded, so tests can assert both what was asked
//! and how often.
//!
//! ```
//! use dbal_rs_core::TimeZones;
//! use dbal_rs_drivers::memory::MemoryDriver;
//! use dbal_rs_drivers::mysql::MysqlResultNormalizerFactory;
//! use dbal_rs_drivers::result::{ColumnTypeDescriptor, RawResult};
//!
//! let driver = MemoryDriver::new("mysql", MysqlResultNormalizerFactory::new(TimeZones::default()))
//!     .respond_to(
//!         "SELECT 1",
//!         RawResult::new(vec![ColumnTypeDescriptor::new("one", "LONGLONG")]).with_row([Some("1")]),
//!     );
//! assert_eq!(driver.query_count(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use dbal_rs_core::{DbalError, DbalResult};

use crate::driver::Driver;
use crate::normalizer::{NormalizerMap, ResultNormalizerFactory};
use crate::result::RawResult;
use crate::value::Value;

/// A statement the driver has executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    /// The SQL text.
    pub sql: String,
    /// The bound parameters.
    pub params: Vec<Value>,
}

/// A driver serving canned results from memory.
pub struct MemoryDriver {
    name: String,
    factory: Box<dyn ResultNormalizerFactory>,
    responses: Vec<(String, RawResult)>,
    executed: RwLock<Vec<ExecutedQuery>>,
    query_count: AtomicUsize,
    affected_rows: AtomicU64,
}

impl MemoryDriver {
    /// Creates a driver with no canned responses.
    pub fn new(name: impl Into<String>, factory: impl ResultNormalizerFactory + 'static) -> Self {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            responses: Vec::new(),
            executed: RwLock::new(Vec::new()),
            query_count: AtomicUsize::new(0),
            affected_rows: AtomicU64::new(0),
        }
    }

    /// Answers any statement containing `fragment` with `result`.
    #[must_use]
    pub fn respond_to(mut self, fragment: impl Into<String>, result: RawResult) -> Self {
        self.responses.push((fragment.into(), result));
        self
    }

    /// Returns how many statements have been executed.
    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    /// Resets the statement counter and the record of executed statements.
    pub async fn reset(&self) {
        self.query_count.store(0, Ordering::Relaxed);
        self.executed.write().await.clear();
    }

    /// Returns every statement executed so far, oldest first.
    pub async fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, sql: &str, params: &[Value]) -> DbalResult<RawResult> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.executed.write().await.push(ExecutedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        let result = self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .ok_or_else(|| {
                DbalError::DatabaseError(format!("No canned response for query: {sql}"))
            })?;
        self.affected_rows
            .store(result.rows.len() as u64, Ordering::Relaxed);
        Ok(result)
    }

    fn resolve_normalizers(&self, types: &HashMap<String, String>) -> NormalizerMap {
        self.factory.resolve(types)
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgsql::PgsqlResultNormalizerFactory;
    use crate::result::ColumnTypeDescriptor;
    use dbal_rs_core::TimeZones;

    fn driver() -> MemoryDriver {
        MemoryDriver::new("pgsql", PgsqlResultNormalizerFactory::new(TimeZones::default()))
            .respond_to(
                "FROM users",
                RawResult::new(vec![ColumnTypeDescriptor::new("id", "int4")])
                    .with_row([Some("1")])
                    .with_row([Some("2")]),
            )
    }

    #[tokio::test]
    async fn test_canned_response() {
        let driver = driver();
        let result = driver
            .query("SELECT id FROM users WHERE id > $1", &[Value::Int(0)])
            .await
            .unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(driver.affected_rows(), 2);
        assert_eq!(driver.query_count(), 1);

        let executed = driver.executed().await;
        assert_eq!(executed[0].params, vec![Value::Int(0)]);
    }

    #[tokio::test]
    async fn test_unknown_query_is_error() {
        let driver = driver();
        let err = driver.query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbalError::DatabaseError(_)));
        assert_eq!(driver.query_count(), 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let driver = driver();
        driver.query("SELECT * FROM users", &[]).await.unwrap();
        driver.reset().await;
        assert_eq!(driver.query_count(), 0);
        assert!(driver.executed().await.is_empty());
    }

    #[test]
    fn test_resolve_uses_factory() {
        let driver = driver();
        let mut types = HashMap::new();
        types.insert("id".to_string(), "int4".to_string());
        types.insert("name".to_string(), "varchar".to_string());
        let map = driver.resolve_normalizers(&types);
        assert!(map.contains("id"));
        assert!(!map.contains("name"));
    }
}
