//! MySQL schema reflection over `information_schema`.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use dbal_rs_core::DbalResult;
use dbal_rs_drivers::{Connection, Value};

use crate::data::{Column, ForeignKey, Fqn, Table};
use crate::feature::Feature;
use crate::platform::Platform;
use crate::reflect::{flag, opt_text, text};

/// The MySQL platform.
#[derive(Debug, Clone)]
pub struct MysqlPlatform {
    connection: Arc<Connection>,
}

impl MysqlPlatform {
    /// The platform name.
    pub const NAME: &'static str = "mysql";

    /// Creates a platform reflecting through `connection`.
    pub const fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

/// Returns the SQL for a schema filter, binding `schema` when given.
fn schema_filter(schema: Option<&str>, params: &mut Vec<Value>) -> &'static str {
    match schema {
        Some(schema) => {
            params.push(Value::from(schema));
            "?"
        }
        None => "DATABASE()",
    }
}

/// Splits `COLUMN_TYPE` text such as `int(10) unsigned` or
/// `decimal(10,2)` into its upper-cased base type, size and signedness.
fn parse_column_type(column_type: &str) -> (String, Option<u32>, bool) {
    static COLUMN_TYPE: OnceLock<Regex> = OnceLock::new();

    let re = COLUMN_TYPE
        .get_or_init(|| Regex::new(r"^(\w+)(?:\((\d+)[^)]*\))?").expect("valid regex"));
    let unsigned = column_type.to_lowercase().contains("unsigned");
    match re.captures(column_type) {
        Some(caps) => (
            caps[1].to_uppercase(),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
            unsigned,
        ),
        None => (column_type.to_uppercase(), None, unsigned),
    }
}

#[async_trait::async_trait]
impl Platform for MysqlPlatform {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn get_tables(&self, schema: Option<&str>) -> DbalResult<HashMap<String, Table>> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = {} \
             ORDER BY TABLE_NAME",
            schema_filter(schema, &mut params)
        );

        let mut tables = HashMap::new();
        for row in &self.connection.query(&sql, &params).await? {
            let table = Table {
                fqn: Fqn::new(text(row, "TABLE_SCHEMA")?, text(row, "TABLE_NAME")?),
                is_view: text(row, "TABLE_TYPE")? == "VIEW",
            };
            tables.insert(table.fqn.to_string(), table);
        }
        Ok(tables)
    }

    async fn get_columns(&self, table: &str) -> DbalResult<HashMap<String, Column>> {
        let fqn = Fqn::parse(table);
        let mut params = Vec::new();
        let schema = schema_filter(fqn.schema(), &mut params);
        params.push(Value::from(fqn.name.as_str()));
        let sql = format!(
            "SELECT COLUMN_NAME, COLUMN_TYPE, COLUMN_DEFAULT, COLUMN_KEY, EXTRA, IS_NULLABLE \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = {schema} AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION"
        );

        let mut columns = HashMap::new();
        for row in &self.connection.query(&sql, &params).await? {
            let (type_, size, is_unsigned) = parse_column_type(&text(row, "COLUMN_TYPE")?);
            let extra = opt_text(row, "EXTRA")?.unwrap_or_default();
            let column = Column {
                name: text(row, "COLUMN_NAME")?,
                type_,
                size,
                default: opt_text(row, "COLUMN_DEFAULT")?,
                is_primary: opt_text(row, "COLUMN_KEY")?.as_deref() == Some("PRI"),
                is_autoincrement: extra.to_lowercase().contains("auto_increment"),
                is_unsigned,
                is_nullable: flag(row, "IS_NULLABLE")?,
                meta: HashMap::new(),
            };
            columns.insert(column.name.clone(), column);
        }
        Ok(columns)
    }

    async fn get_foreign_keys(&self, table: &str) -> DbalResult<HashMap<String, ForeignKey>> {
        let fqn = Fqn::parse(table);
        let mut params = Vec::new();
        let schema = schema_filter(fqn.schema(), &mut params);
        params.push(Value::from(fqn.name.as_str()));
        let sql = format!(
            "SELECT CONSTRAINT_SCHEMA, CONSTRAINT_NAME, COLUMN_NAME, \
             REFERENCED_TABLE_SCHEMA, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = {schema} AND TABLE_NAME = ? \
             AND REFERENCED_TABLE_NAME IS NOT NULL"
        );

        let mut keys = HashMap::new();
        for row in &self.connection.query(&sql, &params).await? {
            let key = ForeignKey {
                fqn: Fqn::new(text(row, "CONSTRAINT_SCHEMA")?, text(row, "CONSTRAINT_NAME")?),
                column: text(row, "COLUMN_NAME")?,
                ref_table: Fqn::new(
                    text(row, "REFERENCED_TABLE_SCHEMA")?,
                    text(row, "REFERENCED_TABLE_NAME")?,
                ),
                ref_column: text(row, "REFERENCED_COLUMN_NAME")?,
            };
            keys.insert(key.column.clone(), key);
        }
        Ok(keys)
    }

    async fn get_primary_sequence_name(&self, _table: &str) -> DbalResult<Option<String>> {
        Ok(None)
    }

    fn is_supported(&self, feature: Feature) -> bool {
        matches!(feature, Feature::MULTI_COLUMN_IN | Feature::QUERY_EXPLAIN)
    }
}
