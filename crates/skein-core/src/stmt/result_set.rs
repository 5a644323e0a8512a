use super::Value;
use crate::{Error, Result};

/// The rows returned by one statement of a batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> ResultSet {
        ResultSet {
            columns,
            rows: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// First column of the first row, as used by identity and count reads.
    pub fn scalar(&self) -> Result<&Value> {
        self.rows
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| Error::invalid_result("expected a scalar value, got no rows"))
    }
}

impl<'a> Row<'a> {
    pub fn new(columns: &'a [String], values: &'a [Value]) -> Row<'a> {
        Row { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self, index: usize) -> Result<&'a Value> {
        self.values.get(index).ok_or_else(|| {
            Error::invalid_result(format!(
                "column index {index} out of range; width={}",
                self.values.len()
            ))
        })
    }

    /// Looks up a column by name, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Result<&'a Value> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(column))
            .and_then(|index| self.values.get(index))
            .ok_or_else(|| Error::invalid_result(format!("column `{column}` missing from row")))
    }
}
