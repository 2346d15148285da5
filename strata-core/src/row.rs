use crate::{Error, Result, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Outcome of processing one virtual query.
///
/// Exposes the same failure two ways: the inspection path (`is_error` /
/// `error`) and the propagating path (`into_result`).
#[derive(Default, Debug, Clone)]
pub struct QueryResponse {
    rows: Vec<RowLabeled>,
    affected: RowsAffected,
    error: Option<Error>,
    /// Whether the rows were served from the query cache.
    from_cache: bool,
}

impl QueryResponse {
    pub fn from_rows(rows: Vec<RowLabeled>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn from_affected(affected: RowsAffected) -> Self {
        Self {
            affected,
            ..Default::default()
        }
    }

    pub fn from_error(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn cached(rows: Vec<RowLabeled>) -> Self {
        Self {
            rows,
            from_cache: true,
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn rows(&self) -> &[RowLabeled] {
        &self.rows
    }

    pub fn into_rows(self) -> Result<Vec<RowLabeled>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.rows),
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.affected.rows_affected
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.affected.last_affected_id
    }

    pub fn into_result(self) -> Result<QueryResponse> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(self),
        }
    }
}
