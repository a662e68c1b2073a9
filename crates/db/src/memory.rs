//! In-process backend holding tables as JSON rows.
//!
//! Used by tests and by the offline mode of the site binary. It records how
//! many selects hit each table and can inject latency and failures, which is
//! what the cache coalescing tests observe.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::backend::{
    require_filters, validate_identifier, Backend, BackendError, Direction, Filter, Row, Select,
};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    select_calls: HashMap<String, usize>,
    failures: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    unique: HashMap<String, Vec<String>>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency` (a `tokio::time::sleep`).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject inserts and updates that would duplicate `column` in `table`.
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(column.to_string());
        self
    }

    /// The unique constraints of the portfolio schema.
    pub fn with_portfolio_constraints(self) -> Self {
        self.with_unique("categories", "key")
    }

    /// Build a backend from a JSON object mapping table names to row arrays.
    pub fn from_seed(seed: Value) -> Result<Self, BackendError> {
        let Value::Object(tables) = seed else {
            return Err(BackendError::InvalidPayload("seed".to_string()));
        };
        let backend = Self::new().with_portfolio_constraints();
        for (table, rows) in tables {
            validate_identifier(&table)?;
            let Value::Array(rows) = rows else {
                return Err(BackendError::InvalidPayload(table));
            };
            backend.seed(&table, rows);
        }
        Ok(backend)
    }

    /// Load a JSON seed file; see [`from_seed`](Self::from_seed).
    pub fn from_seed_file(path: &Path) -> Result<Self, BackendError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BackendError::Decode(format!("Failed to read seed {}: {e}", path.display()))
        })?;
        let seed: Value =
            serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))?;
        Self::from_seed(seed)
    }

    /// Append rows to a table as-is, without constraint checks.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.lock().rows.entry(table.to_string()).or_default().extend(rows);
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    /// Number of selects issued against `table`, including failed ones.
    pub fn select_calls(&self, table: &str) -> usize {
        self.lock().select_calls.get(table).copied().unwrap_or(0)
    }

    /// Make the next `count` selects on `table` fail with a 503.
    pub fn fail_next_selects(&self, table: &str, count: usize) {
        self.lock().failures.insert(table.to_string(), count);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_unique(
        &self,
        table: &str,
        rows: &[Row],
        candidate: &Row,
        skip: Option<usize>,
    ) -> Result<(), BackendError> {
        let Some(columns) = self.unique.get(table) else {
            return Ok(());
        };
        for column in columns {
            let Some(value) = candidate.get(column) else {
                continue;
            };
            let duplicate = rows
                .iter()
                .enumerate()
                .any(|(idx, row)| Some(idx) != skip && row.get(column) == Some(value));
            if duplicate {
                return Err(BackendError::Conflict(format!(
                    "Duplicate value for {table}.{column}: {value}"
                )));
            }
        }
        Ok(())
    }
}

fn matches_filters(row: &Row, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| row.get(&f.column).unwrap_or(&Value::Null) == &f.value)
}

/// Total order over the JSON scalars stored in rows. Nulls sort first;
/// mismatched types compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn as_object(table: &str, row: Row) -> Result<Map<String, Value>, BackendError> {
    match row {
        Value::Object(map) => Ok(map),
        _ => Err(BackendError::InvalidPayload(table.to_string())),
    }
}

fn now_value() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        validate_identifier(&query.table)?;
        {
            let mut tables = self.lock();
            *tables.select_calls.entry(query.table.clone()).or_default() += 1;
        }
        self.simulate_latency().await;

        let mut guard = self.lock();
        let tables = &mut *guard;
        if let Some(remaining) = tables.failures.get_mut(&query.table) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BackendError::Http {
                    status: 503,
                    body: format!("injected failure for '{}'", query.table),
                });
            }
        }

        let mut rows: Vec<Row> = tables
            .rows
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filters(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            query.order.iter().fold(Ordering::Equal, |acc, order| {
                acc.then_with(|| {
                    let ord = compare_values(
                        a.get(&order.column).unwrap_or(&Value::Null),
                        b.get(&order.column).unwrap_or(&Value::Null),
                    );
                    match order.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    }
                })
            })
        });

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        validate_identifier(table)?;
        let mut map = as_object(table, row)?;
        self.simulate_latency().await;

        if map.get("id").map_or(true, Value::is_null) {
            map.insert("id".into(), Value::String(uuid::Uuid::now_v7().to_string()));
        }
        for column in ["created_at", "updated_at"] {
            if map.get(column).map_or(true, Value::is_null) {
                map.insert(column.into(), now_value());
            }
        }
        let row = Value::Object(map);

        let mut tables = self.lock();
        let existing = tables.rows.entry(table.to_string()).or_default();
        self.check_unique(table, existing, &row, None)?;
        existing.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError> {
        validate_identifier(table)?;
        require_filters("update", table, filters)?;
        let patch = as_object(table, patch)?;
        self.simulate_latency().await;

        let mut tables = self.lock();
        let rows = tables.rows.entry(table.to_string()).or_default();
        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_filters(row, filters))
            .map(|(idx, _)| idx)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for idx in targets {
            let mut candidate = rows[idx].clone();
            if let Value::Object(map) = &mut candidate {
                for (k, v) in &patch {
                    map.insert(k.clone(), v.clone());
                }
                map.insert("updated_at".into(), now_value());
            }
            self.check_unique(table, rows, &candidate, Some(idx))?;
            rows[idx] = candidate.clone();
            updated.push(candidate);
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        validate_identifier(table)?;
        require_filters("delete", table, filters)?;
        self.simulate_latency().await;

        let mut tables = self.lock();
        let Some(rows) = tables.rows.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches_filters(row, filters));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new().with_portfolio_constraints();
        backend.seed(
            "projects",
            vec![
                json!({"id": "1", "category": "admin", "title": "B", "rank": 2}),
                json!({"id": "2", "category": "design", "title": "A", "rank": 1}),
                json!({"id": "3", "category": "admin", "title": "C", "rank": 3}),
            ],
        );
        backend
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let backend = seeded();
        let q = Select::table("projects")
            .filter("category", "admin")
            .order_by("rank", Direction::Desc)
            .limit(Some(1));
        let rows = backend.select(&q).await.unwrap();
        assert_eq!(rows, vec![json!({"id": "3", "category": "admin", "title": "C", "rank": 3})]);
        assert_eq!(backend.select_calls("projects"), 1);
    }

    #[tokio::test]
    async fn select_unknown_table_is_empty() {
        let backend = MemoryBackend::new();
        let rows = backend.select(&Select::table("nothing")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let backend = seeded();
        backend.fail_next_selects("projects", 1);
        let q = Select::table("projects");
        assert_matches!(
            backend.select(&q).await,
            Err(BackendError::Http { status: 503, .. })
        );
        assert_eq!(backend.select(&q).await.unwrap().len(), 3);
        assert_eq!(backend.select_calls("projects"), 2);
    }

    #[tokio::test]
    async fn insert_fills_generated_columns() {
        let backend = MemoryBackend::new();
        let row = backend
            .insert("categories", json!({"key": "admin", "name": "Admin"}))
            .await
            .unwrap();
        assert!(row["id"].is_string());
        assert!(row["created_at"].is_string());
        assert_eq!(backend.rows("categories").len(), 1);
    }

    #[tokio::test]
    async fn unique_columns_reject_duplicates() {
        let backend = MemoryBackend::new().with_portfolio_constraints();
        backend
            .insert("categories", json!({"key": "admin"}))
            .await
            .unwrap();
        assert_matches!(
            backend.insert("categories", json!({"key": "admin"})).await,
            Err(BackendError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let backend = seeded();
        let updated = backend
            .update("projects", &[Filter::eq("id", "2")], json!({"title": "Z"}))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["title"], "Z");
        assert_eq!(updated[0]["category"], "design");
    }

    #[tokio::test]
    async fn update_and_delete_need_filters() {
        let backend = seeded();
        assert_matches!(
            backend.update("projects", &[], json!({})).await,
            Err(BackendError::MissingFilter { .. })
        );
        assert_matches!(
            backend.delete("projects", &[]).await,
            Err(BackendError::MissingFilter { .. })
        );
    }

    #[tokio::test]
    async fn delete_counts_rows() {
        let backend = seeded();
        let removed = backend
            .delete("projects", &[Filter::eq("category", "admin")])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(backend.rows("projects").len(), 1);
    }

    #[test]
    fn seed_must_be_an_object_of_arrays() {
        assert!(MemoryBackend::from_seed(json!([])).is_err());
        assert!(MemoryBackend::from_seed(json!({"projects": {}})).is_err());
        let backend = MemoryBackend::from_seed(json!({"projects": [{"id": "1"}]})).unwrap();
        assert_eq!(backend.rows("projects").len(), 1);
    }

    #[test]
    fn nulls_sort_first() {
        assert_eq!(compare_values(&Value::Null, &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(1.5)), Ordering::Greater);
    }
}
