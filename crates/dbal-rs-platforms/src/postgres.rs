//! PostgreSQL schema reflection over `information_schema`.
//!
//! Serial columns are recognised by their `nextval('...')` default. The
//! sequence name is kept in [`Column::meta`] under [`SEQUENCE_META`], which
//! is where [`Platform::get_primary_sequence_name`] reads it from.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use dbal_rs_core::DbalResult;
use dbal_rs_drivers::{Connection, Value};

use crate::data::{Column, ForeignKey, Fqn, Table};
use crate::feature::Feature;
use crate::platform::Platform;
use crate::reflect::{flag, opt_text, size, text};

/// The [`Column::meta`] key holding a serial column's sequence name.
pub const SEQUENCE_META: &str = "sequence";

/// The PostgreSQL platform.
#[derive(Debug, Clone)]
pub struct PostgresPlatform {
    connection: Arc<Connection>,
}

impl PostgresPlatform {
    /// The platform name.
    pub const NAME: &'static str = "pgsql";

    /// Creates a platform reflecting through `connection`.
    pub const fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

/// Positional parameters for a query filtering on schema and, optionally,
/// on a table name.
struct Filter {
    params: Vec<Value>,
}

impl Filter {
    const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Binds `value` and returns its placeholder.
    fn bind(&mut self, value: &str) -> String {
        self.params.push(Value::from(value));
        format!("${}", self.params.len())
    }

    /// Binds `schema`, or falls back to the session's current schema.
    fn schema(&mut self, schema: Option<&str>) -> String {
        schema.map_or_else(|| "current_schema()".to_string(), |s| self.bind(s))
    }
}

/// Extracts `seq` from a default such as `nextval('seq'::regclass)`.
fn sequence_from_default(default: &str) -> Option<String> {
    static NEXTVAL: OnceLock<Regex> = OnceLock::new();

    let re = NEXTVAL.get_or_init(|| Regex::new(r"^nextval\('([^']+)'").expect("valid regex"));
    re.captures(default).map(|caps| caps[1].to_string())
}

#[async_trait::async_trait]
impl Platform for PostgresPlatform {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn get_tables(&self, schema: Option<&str>) -> DbalResult<HashMap<String, Table>> {
        let mut filter = Filter::new();
        let sql = format!(
            "SELECT table_schema, table_name, table_type \
             FROM information_schema.tables \
             WHERE table_schema = {} \
             ORDER BY table_name",
            filter.schema(schema)
        );

        let mut tables = HashMap::new();
        for row in &self.connection.query(&sql, &filter.params).await? {
            let table = Table {
                fqn: Fqn::new(text(row, "table_schema")?, text(row, "table_name")?),
                is_view: text(row, "table_type")? == "VIEW",
            };
            tables.insert(table.fqn.to_string(), table);
        }
        Ok(tables)
    }

    async fn get_columns(&self, table: &str) -> DbalResult<HashMap<String, Column>> {
        let fqn = Fqn::parse(table);
        let mut filter = Filter::new();
        let schema = filter.schema(fqn.schema());
        let name = filter.bind(&fqn.name);
        let sql = format!(
            "SELECT c.column_name, c.udt_name, \
             COALESCE(c.character_maximum_length, c.numeric_precision) AS size, \
             c.column_default, c.is_nullable, \
             EXISTS ( \
               SELECT 1 FROM information_schema.table_constraints tc \
               JOIN information_schema.key_column_usage kcu \
                 ON kcu.constraint_name = tc.constraint_name \
                AND kcu.constraint_schema = tc.constraint_schema \
               WHERE tc.constraint_type = 'PRIMARY KEY' \
                 AND tc.table_schema = c.table_schema \
                 AND tc.table_name = c.table_name \
                 AND kcu.column_name = c.column_name \
             ) AS is_primary \
             FROM information_schema.columns c \
             WHERE c.table_schema = {schema} AND c.table_name = {name} \
             ORDER BY c.ordinal_position"
        );

        let mut columns = HashMap::new();
        for row in &self.connection.query(&sql, &filter.params).await? {
            let default = opt_text(row, "column_default")?;
            let sequence = default.as_deref().and_then(sequence_from_default);

            let mut column = Column::new(text(row, "column_name")?, text(row, "udt_name")?.to_uppercase());
            column.size = size(row, "size")?;
            column.is_primary = flag(row, "is_primary")?;
            column.is_nullable = flag(row, "is_nullable")?;
            column.is_autoincrement = sequence.is_some();
            if let Some(sequence) = sequence {
                column.meta.insert(SEQUENCE_META.to_string(), sequence);
            }
            column.default = default;
            columns.insert(column.name.clone(), column);
        }
        Ok(columns)
    }

    async fn get_foreign_keys(&self, table: &str) -> DbalResult<HashMap<String, ForeignKey>> {
        let fqn = Fqn::parse(table);
        let mut filter = Filter::new();
        let schema = filter.schema(fqn.schema());
        let name = filter.bind(&fqn.name);
        let sql = format!(
            "SELECT tc.constraint_schema, tc.constraint_name, kcu.column_name, \
             ccu.table_schema AS ref_table_schema, ccu.table_name AS ref_table_name, \
             ccu.column_name AS ref_column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON kcu.constraint_name = tc.constraint_name \
              AND kcu.constraint_schema = tc.constraint_schema \
             JOIN information_schema.constraint_column_usage ccu \
               ON ccu.constraint_name = tc.constraint_name \
              AND ccu.constraint_schema = tc.constraint_schema \
             WHERE tc.constraint_type = 'FOREIGN KEY' \
               AND tc.table_schema = {schema} AND tc.table_name = {name}"
        );

        let mut keys = HashMap::new();
        for row in &self.connection.query(&sql, &filter.params).await? {
            let key = ForeignKey {
                fqn: Fqn::new(text(row, "constraint_schema")?, text(row, "constraint_name")?),
                column: text(row, "column_name")?,
                ref_table: Fqn::new(text(row, "ref_table_schema")?, text(row, "ref_table_name")?),
                ref_column: text(row, "ref_column_name")?,
            };
            keys.insert(key.column.clone(), key);
        }
        Ok(keys)
    }

    async fn get_primary_sequence_name(&self, table: &str) -> DbalResult<Option<String>> {
        let columns = self.get_columns(table).await?;
        let mut serial: Vec<&Column> = columns
            .values()
            .filter(|c| c.is_primary && c.is_autoincrement)
            .collect();
        serial.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(serial
            .first()
            .and_then(|c| c.meta.get(SEQUENCE_META).cloned()))
    }

    fn is_supported(&self, feature: Feature) -> bool {
        matches!(feature, Feature::MULTI_COLUMN_IN | Feature::QUERY_EXPLAIN)
    }
}
