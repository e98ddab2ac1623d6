//! Schema descriptors returned by platform reflection.
//!
//! Every type here is serde-serializable so that
//! [`CachedPlatform`](crate::cached::CachedPlatform) can store it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A schema-qualified object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fqn {
    /// The schema (MySQL database) name. Empty when unknown.
    pub schema: String,
    /// The object name.
    pub name: String,
}

impl Fqn {
    /// Creates a new name.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Splits `schema.name`; a bare `name` gets an empty schema.
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new("", qualified),
        }
    }

    /// Returns the schema, or `None` when it is empty.
    pub fn schema(&self) -> Option<&str> {
        (!self.schema.is_empty()).then_some(self.schema.as_str())
    }
}

impl fmt::Display for Fqn {
    /// Formats as `schema.name`, or just `name` without a schema.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.schema, self.name)
        }
    }
}

/// A table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// The qualified name.
    pub fqn: Fqn,
    /// Whether this is a view rather than a base table.
    pub is_view: bool,
}

impl Table {
    /// Returns the unqualified table name.
    pub fn name(&self) -> &str {
        &self.fqn.name
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// The column name.
    pub name: String,
    /// The upper-cased base type, e.g. `VARCHAR` or `INT4`.
    pub type_: String,
    /// The declared length or precision, if any.
    pub size: Option<u32>,
    /// The default expression, if any.
    pub default: Option<String>,
    /// Whether the column is part of the primary key.
    pub is_primary: bool,
    /// Whether values are generated by the server.
    pub is_autoincrement: bool,
    /// Whether the numeric type is unsigned.
    pub is_unsigned: bool,
    /// Whether NULL is allowed.
    pub is_nullable: bool,
    /// Backend-specific extras, e.g. `sequence` on PostgreSQL.
    pub meta: HashMap<String, String>,
}

impl Column {
    /// Creates a nullable, non-key column of `type_`.
    pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            size: None,
            default: None,
            is_primary: false,
            is_autoincrement: false,
            is_unsigned: false,
            is_nullable: true,
            meta: HashMap::new(),
        }
    }
}

/// A single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// The qualified constraint name.
    pub fqn: Fqn,
    /// The referencing column.
    pub column: String,
    /// The referenced table.
    pub ref_table: Fqn,
    /// The referenced column.
    pub ref_column: String,
}
