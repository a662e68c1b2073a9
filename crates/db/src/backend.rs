//! The row-level contract every backend implementation provides.
//!
//! Rows travel as JSON objects; repositories decode them into typed models.
//! Filters are equality-only, which is all the portfolio queries need.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A single row as returned by the backend.
pub type Row = Value;

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Text form of the filter value, as compared against a column cast to
    /// text.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A row select: table, equality filters, ordering and optional limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Errors from any backend implementation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row could not be decoded into the expected model.
    #[error("Failed to decode row: {0}")]
    Decode(String),

    /// A unique constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Update and delete refuse to run without a filter.
    #[error("Refusing to {operation} every row of '{table}' without a filter")]
    MissingFilter {
        operation: &'static str,
        table: String,
    },

    /// The payload for an insert or update was not a JSON object.
    #[error("Row payload for '{0}' must be a JSON object")]
    InvalidPayload(String),
}

/// The thin client contract over the hosted relational store.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Select rows matching the query.
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError>;

    /// Insert one row, returning the stored row with generated columns.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError>;

    /// Apply `patch` to all rows matching `filters`, returning the updated
    /// rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError>;

    /// Delete rows matching `filters`, returning how many were removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError>;
}

/// Table and column names must be plain SQL identifiers.
pub fn validate_identifier(name: &str) -> Result<(), BackendError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_start && valid_rest && name.len() <= 63 {
        Ok(())
    } else {
        Err(BackendError::InvalidIdentifier(name.to_string()))
    }
}

pub(crate) fn require_filters(
    operation: &'static str,
    table: &str,
    filters: &[Filter],
) -> Result<(), BackendError> {
    if filters.is_empty() {
        return Err(BackendError::MissingFilter {
            operation,
            table: table.to_string(),
        });
    }
    Ok(())
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, BackendError> {
    serde_json::from_value(row).map_err(|e| BackendError::Decode(e.to_string()))
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, BackendError> {
    rows.into_iter().map(decode_row).collect()
}

/// Serialize a DTO into a row payload.
pub fn encode_row<T: serde::Serialize>(value: &T) -> Result<Row, BackendError> {
    serde_json::to_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}
