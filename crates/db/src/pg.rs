//! Direct Postgres access through `sqlx`.
//!
//! Used by owner tooling and local development against a plain Postgres
//! database carrying the schema in `migrations/`. Rows are returned as JSON
//! via `to_jsonb` so the same repositories work over every backend.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;

use crate::backend::{
    require_filters, validate_identifier, Backend, BackendError, Filter, Row, Select,
};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Render `WHERE` clauses comparing each column, cast to text, with a
/// positional parameter starting at `$first_param`.
fn where_clause(filters: &[Filter], first_param: usize) -> Result<String, BackendError> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(filters.len());
    for (i, filter) in filters.iter().enumerate() {
        validate_identifier(&filter.column)?;
        parts.push(format!("t.{}::text = ${}", filter.column, first_param + i));
    }
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

/// Build the SQL for a select. Parameters are the filter values in order.
pub fn build_select_sql(query: &Select) -> Result<String, BackendError> {
    validate_identifier(&query.table)?;
    let mut sql = format!(
        "SELECT to_jsonb(t) FROM {} AS t{}",
        query.table,
        where_clause(&query.filters, 1)?
    );

    if !query.order.is_empty() {
        let mut parts = Vec::with_capacity(query.order.len());
        for order in &query.order {
            validate_identifier(&order.column)?;
            parts.push(format!(
                "t.{} {}",
                order.column,
                order.direction.as_str().to_uppercase()
            ));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&parts.join(", "));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(sql)
}

/// Column names present in a row payload, validated.
fn payload_columns(table: &str, row: &Row) -> Result<Vec<String>, BackendError> {
    let map = row
        .as_object()
        .ok_or_else(|| BackendError::InvalidPayload(table.to_string()))?;
    let mut columns = Vec::with_capacity(map.len());
    for key in map.keys() {
        validate_identifier(key)?;
        columns.push(key.clone());
    }
    Ok(columns)
}

/// Build the SQL for an insert. `$1` is the row payload as JSONB.
pub fn build_insert_sql(table: &str, row: &Row) -> Result<String, BackendError> {
    validate_identifier(table)?;
    let columns = payload_columns(table, row)?.join(", ");
    Ok(format!(
        "WITH inserted AS (\
         INSERT INTO {table} ({columns}) \
         SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
         RETURNING *) \
         SELECT to_jsonb(inserted) FROM inserted"
    ))
}

/// Build the SQL for an update. `$1` is the patch as JSONB; filter values
/// follow from `$2`.
pub fn build_update_sql(table: &str, filters: &[Filter], patch: &Row) -> Result<String, BackendError> {
    validate_identifier(table)?;
    require_filters("update", table, filters)?;
    let columns = payload_columns(table, patch)?;
    if columns.is_empty() {
        return Err(BackendError::InvalidPayload(table.to_string()));
    }
    let assignments = columns
        .iter()
        .map(|c| format!("{c} = p.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "WITH updated AS (\
         UPDATE {table} AS t SET {assignments} \
         FROM jsonb_populate_record(NULL::{table}, $1) AS p{} \
         RETURNING t.*) \
         SELECT to_jsonb(updated) FROM updated",
        where_clause(filters, 2)?
    ))
}

/// Build the SQL for a delete. Filter values start at `$1`.
pub fn build_delete_sql(table: &str, filters: &[Filter]) -> Result<String, BackendError> {
    validate_identifier(table)?;
    require_filters("delete", table, filters)?;
    Ok(format!(
        "DELETE FROM {table} AS t{}",
        where_clause(filters, 1)?
    ))
}

#[async_trait]
impl Backend for PgBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        let sql = build_select_sql(query)?;
        let mut q = sqlx::query_scalar::<_, serde_json::Value>(&sql);
        for filter in &query.filters {
            q = q.bind(filter.value_text());
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        let sql = build_insert_sql(table, &row)?;
        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(row)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError> {
        let sql = build_update_sql(table, filters, &patch)?;
        let mut q = sqlx::query_scalar::<_, serde_json::Value>(&sql).bind(patch);
        for filter in filters {
            q = q.bind(filter.value_text());
        }
        q.fetch_all(&self.pool).await.map_err(classify_sqlx_error)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let sql = build_delete_sql(table, filters)?;
        let mut q = sqlx::query(&sql);
        for filter in filters {
            q = q.bind(filter.value_text());
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Map unique constraint violations (SQLSTATE 23505) to
/// [`BackendError::Conflict`]; everything else stays a database error.
fn classify_sqlx_error(err: sqlx::Error) -> BackendError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return BackendError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ));
        }
    }
    BackendError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Direction;
    use serde_json::json;

    #[test]
    fn select_sql_with_filters_order_and_limit() {
        let q = Select::table("projects")
            .filter("category", "admin")
            .filter("hidden", false)
            .order_by("created_at", Direction::Desc)
            .limit(Some(5));
        assert_eq!(
            build_select_sql(&q).unwrap(),
            "SELECT to_jsonb(t) FROM projects AS t \
             WHERE t.category::text = $1 AND t.hidden::text = $2 \
             ORDER BY t.created_at DESC LIMIT 5"
        );
    }

    #[test]
    fn select_sql_without_clauses() {
        let q = Select::table("categories");
        assert_eq!(
            build_select_sql(&q).unwrap(),
            "SELECT to_jsonb(t) FROM categories AS t"
        );
    }

    #[test]
    fn insert_sql_lists_payload_columns() {
        let sql = build_insert_sql("categories", &json!({"key": "admin", "name": "Admin"}))
            .unwrap();
        assert!(sql.contains("INSERT INTO categories (key, name)"));
        assert!(sql.contains("SELECT key, name FROM jsonb_populate_record(NULL::categories, $1)"));
    }

    #[test]
    fn update_sql_numbers_filters_after_payload() {
        let sql = build_update_sql(
            "categories",
            &[Filter::eq("key", "admin")],
            &json!({"hidden": true}),
        )
        .unwrap();
        assert!(sql.contains("SET hidden = p.hidden"));
        assert!(sql.contains("WHERE t.key::text = $2"));
    }

    #[test]
    fn update_sql_rejects_empty_patch_and_missing_filter() {
        assert!(build_update_sql("categories", &[Filter::eq("key", "a")], &json!({})).is_err());
        assert!(build_update_sql("categories", &[], &json!({"name": "x"})).is_err());
    }

    #[test]
    fn delete_sql() {
        assert_eq!(
            build_delete_sql("projects", &[Filter::eq("id", "x")]).unwrap(),
            "DELETE FROM projects AS t WHERE t.id::text = $1"
        );
        assert!(build_delete_sql("projects", &[]).is_err());
    }

    #[test]
    fn payload_keys_are_validated() {
        assert!(build_insert_sql("projects", &json!({"title; --": 1})).is_err());
        assert!(build_insert_sql("projects", &json!([1])).is_err());
    }
}
