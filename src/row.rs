//! Result rows handed to readers.
//!
//! A [`Row`] owns copies of one result row's column values. The values are
//! only available while the reader runs; advancing the cursor produces a new
//! row, so readers must copy out whatever they keep.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::value::Value;

/// Failure while reading a typed value out of a row.
///
/// Implements [`std::error::Error`], so readers can propagate it with `?`
/// straight into the template's mapping error.
#[derive(Debug, Error)]
pub enum RowError {
    /// The requested column is not part of the result.
    #[error("no such column: {0}")]
    NoSuchColumn(String),

    /// The column exists but holds a different value type.
    #[error("column {column} is not a {expected} (found {found})")]
    TypeMismatch {
        /// Requested column name.
        column: String,
        /// Expected value type.
        expected: &'static str,
        /// Actual variant found.
        found: &'static str,
    },
}

/// One row of a query result.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<FxHashMap<String, usize>>,
    values: SmallVec<[Value; 8]>,
}

impl Row {
    /// Builds a row from a shared column index and the row's values.
    pub fn new(columns: Arc<FxHashMap<String, usize>>, values: SmallVec<[Value; 8]>) -> Self {
        Self { columns, values }
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a column value by name.
    pub fn get(&self, column: &str) -> Result<&Value, RowError> {
        self.columns
            .get(column)
            .and_then(|i| self.values.get(*i))
            .ok_or_else(|| RowError::NoSuchColumn(column.to_string()))
    }

    /// Reads a string column.
    pub fn string(&self, column: &str) -> Result<String, RowError> {
        let value = self.get(column)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::mismatch(column, "string", value))
    }

    /// Reads an integer column.
    pub fn int(&self, column: &str) -> Result<i64, RowError> {
        let value = self.get(column)?;
        value
            .as_int()
            .ok_or_else(|| Self::mismatch(column, "int", value))
    }

    /// Reads a float column, accepting integer widening.
    pub fn float(&self, column: &str) -> Result<f64, RowError> {
        let value = self.get(column)?;
        value
            .as_float()
            .ok_or_else(|| Self::mismatch(column, "float", value))
    }

    /// Reads a boolean column.
    pub fn bool(&self, column: &str) -> Result<bool, RowError> {
        let value = self.get(column)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mismatch(column, "bool", value))
    }

    /// Reads a list column as strings.
    pub fn string_list(&self, column: &str) -> Result<Vec<String>, RowError> {
        let value = self.get(column)?;
        let items = value
            .as_list()
            .ok_or_else(|| Self::mismatch(column, "list", value))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Self::mismatch(column, "string", item))
            })
            .collect()
    }

    fn mismatch(column: &str, expected: &'static str, found: &Value) -> RowError {
        RowError::TypeMismatch {
            column: column.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn row() -> Row {
        let mut columns = FxHashMap::default();
        columns.insert("name".to_string(), 0);
        columns.insert("age".to_string(), 1);
        Row::new(
            Arc::new(columns),
            smallvec![Value::from("Alice"), Value::from(30i64)],
        )
    }

    #[test]
    fn typed_getters() {
        let row = row();
        assert_eq!(row.string("name").unwrap(), "Alice");
        assert_eq!(row.int("age").unwrap(), 30);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = row().get("missing").unwrap_err();
        assert!(matches!(err, RowError::NoSuchColumn(_)));
    }

    #[test]
    fn type_mismatch_names_the_column() {
        let err = row().int("name").unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
