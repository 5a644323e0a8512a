use crate::{stmt::ResultSet, Error, Result};
use std::collections::VecDeque;

/// Results of one round trip, one entry per statement.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub results: VecDeque<Rows>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// Number of rows impacted by the statement
    Count(u64),

    /// Rows returned by the statement
    Values(ResultSet),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            results: VecDeque::from([Rows::Count(count)]),
        }
    }

    pub fn push(&mut self, rows: Rows) {
        self.results.push_back(rows);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Takes the next statement's result.
    pub fn next_rows(&mut self) -> Result<Rows> {
        self.results
            .pop_front()
            .ok_or_else(|| Error::invalid_result("response has no more result sets"))
    }

    /// Sum of affected-row counts across all statements.
    pub fn total_count(&self) -> u64 {
        self.results
            .iter()
            .map(|rows| match rows {
                Rows::Count(count) => *count,
                Rows::Values(_) => 0,
            })
            .sum()
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }

    pub fn into_values(self) -> Result<ResultSet> {
        match self {
            Rows::Values(values) => Ok(values),
            Rows::Count(_) => Err(Error::invalid_result("expected rows, got a count")),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            Rows::Count(count) => Ok(count),
            Rows::Values(_) => Err(Error::invalid_result("expected a count, got rows")),
        }
    }
}
