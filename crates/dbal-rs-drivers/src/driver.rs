//! The driver trait.
//!
//! A [`Driver`] owns one live session with a database server. It executes
//! SQL and reports results as raw text together with native column types;
//! turning those into canonical values is left to the
//! [`ResultNormalizerFactory`](crate::normalizer::ResultNormalizerFactory)
//! behind [`Driver::resolve_normalizers`].
//!
//! Wire-protocol implementations live outside this crate. Tests use
//! [`MemoryDriver`](crate::memory::MemoryDriver).

use std::collections::HashMap;

use dbal_rs_core::DbalResult;

use crate::normalizer::NormalizerMap;
use crate::result::RawResult;
use crate::value::Value;

/// A database session.
///
/// All I/O methods are async; implementations backed by blocking client
/// libraries should wrap calls in `spawn_blocking`.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Returns the engine name (`mysql` or `pgsql`).
    fn name(&self) -> &str;

    /// Executes a statement with positional parameters.
    async fn query(&self, sql: &str, params: &[Value]) -> DbalResult<RawResult>;

    /// Resolves normalizers for a column name to native type tag mapping.
    fn resolve_normalizers(&self, types: &HashMap<String, String>) -> NormalizerMap;

    /// Returns the number of rows changed by the last statement.
    fn affected_rows(&self) -> u64;
}
