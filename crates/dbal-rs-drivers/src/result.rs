//! Raw and normalized query results.
//!
//! A [`Driver`](crate::driver::Driver) returns a [`RawResult`]: column type
//! descriptors plus rows of raw text. [`ResultSet::from_raw`] runs every
//! value through a [`NormalizerMap`] and produces [`Row`]s of canonical
//! [`Value`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dbal_rs_core::{DbalError, DbalResult};

use crate::normalizer::NormalizerMap;
use crate::value::Value;

/// A result column and the native type tag the driver reported for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnTypeDescriptor {
    /// The column name.
    pub name: String,
    /// The backend-native type tag, e.g. `LONGLONG` or `timestamptz`.
    pub type_tag: String,
}

impl ColumnTypeDescriptor {
    /// Creates a new descriptor.
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// What a driver returns for a query: column metadata plus raw text rows.
///
/// `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    /// The columns, in result order.
    pub columns: Vec<ColumnTypeDescriptor>,
    /// The rows; each has one entry per column.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawResult {
    /// Creates a result with the given columns and no rows.
    pub fn new(columns: Vec<ColumnTypeDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    #[must_use]
    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.rows
            .push(row.into_iter().map(|v| v.map(Into::into)).collect());
        self
    }

    /// Returns the column name to type tag mapping normalizers resolve from.
    pub fn column_types(&self) -> HashMap<String, String> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.type_tag.clone()))
            .collect()
    }
}

/// A single normalized row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a value by column name.
    ///
    /// # Errors
    ///
    /// Returns [`DbalError::ColumnNotFound`] if the row has no such column.
    pub fn get(&self, column: &str) -> DbalResult<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
            .ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds.
    pub fn get_by_index(&self, idx: usize) -> DbalResult<&Value> {
        self.values.get(idx).ok_or_else(|| {
            DbalError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning `(column, value)` pairs.
    pub fn into_pairs(self) -> impl Iterator<Item = (String, Value)> {
        self.columns.into_iter().zip(self.values)
    }
}

/// Normalized rows of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    /// Normalizes every value of `raw` with `normalizers`.
    ///
    /// # Errors
    ///
    /// The first value a normalizer rejects aborts materialization and its
    /// error is returned. A row whose width differs from the column list is
    /// a [`DbalError::DatabaseError`].
    pub fn from_raw(raw: RawResult, normalizers: &NormalizerMap) -> DbalResult<Self> {
        let names: Vec<String> = raw.columns.into_iter().map(|c| c.name).collect();
        let mut rows = Vec::with_capacity(raw.rows.len());

        for raw_row in raw.rows {
            if raw_row.len() != names.len() {
                return Err(DbalError::DatabaseError(format!(
                    "Row has {} values but the result has {} columns",
                    raw_row.len(),
                    names.len()
                )));
            }
            let values = names
                .iter()
                .zip(&raw_row)
                .map(|(name, raw)| normalizers.normalize(name, raw.as_deref()))
                .collect::<DbalResult<Vec<_>>>()?;
            rows.push(Row::new(names.clone(), values));
        }

        Ok(Self { rows })
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the first row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
