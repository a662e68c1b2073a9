//! HTTP client for the hosted REST endpoint.
//!
//! Speaks the PostgREST dialect exposed by the hosted store: tables live
//! under `/rest/v1/{table}`, equality filters are `column=eq.value`, ordering
//! is `order=col.asc,col2.desc`. Every request carries the project's anon key
//! and, when someone is signed in, their bearer token so row-level security
//! applies to the right role.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::{AuthContext, AuthUser};
use crate::backend::{
    require_filters, validate_identifier, Backend, BackendError, Filter, Row, Select,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection settings for [`RestBackend`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://abc.example.co`.
    pub api_url: String,
    /// Public anon key sent as the `apikey` header.
    pub anon_key: String,
    pub timeout: Duration,
}

pub struct RestBackend {
    client: reqwest::Client,
    config: RestConfig,
    auth: AuthContext,
}

/// Response of the password grant endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

impl RestBackend {
    pub fn new(config: RestConfig, auth: AuthContext) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(client, config, auth))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, mut config: RestConfig, auth: AuthContext) -> Self {
        while config.api_url.ends_with('/') {
            config.api_url.pop();
        }
        Self {
            client,
            config,
            auth,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Sign in with email and password. On success the session is stored in
    /// the shared [`AuthContext`].
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/auth/v1/token?grant_type=password",
                self.config.api_url
            ))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token: TokenResponse = Self::parse_response(response).await?;
        self.auth
            .set_session(token.user.clone(), Some(token.access_token));
        tracing::info!(user_id = %token.user.id, "Signed in");
        Ok(token.user)
    }

    fn table_url(&self, table: &str) -> Result<String, BackendError> {
        validate_identifier(table)?;
        Ok(format!("{}/rest/v1/{}", self.config.api_url, table))
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let bearer = self
            .auth
            .access_token()
            .unwrap_or_else(|| self.config.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`BackendError::Http`] carrying the status
    /// and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            if status == reqwest::StatusCode::CONFLICT {
                return Err(BackendError::Conflict(body));
            }
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Query-string pairs for a select request.
pub fn select_params(query: &Select) -> Result<Vec<(String, String)>, BackendError> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters)?);

    if !query.order.is_empty() {
        let mut parts = Vec::with_capacity(query.order.len());
        for order in &query.order {
            validate_identifier(&order.column)?;
            parts.push(format!("{}.{}", order.column, order.direction.as_str()));
        }
        params.push(("order".to_string(), parts.join(",")));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    Ok(params)
}

/// Query-string pairs for equality filters.
pub fn filter_params(filters: &[Filter]) -> Result<Vec<(String, String)>, BackendError> {
    filters
        .iter()
        .map(|f| {
            validate_identifier(&f.column)?;
            Ok((f.column.clone(), format!("eq.{}", f.value_text())))
        })
        .collect()
}

fn ensure_object(table: &str, row: &Row) -> Result<(), BackendError> {
    if row.is_object() {
        Ok(())
    } else {
        Err(BackendError::InvalidPayload(table.to_string()))
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        let url = self.table_url(&query.table)?;
        let params = select_params(query)?;

        let response = self
            .request(reqwest::Method::GET, url)
            .query(&params)
            .send()
            .await?;

        let rows: Vec<Row> = Self::parse_response(response).await?;
        tracing::debug!(table = %query.table, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        ensure_object(table, &row)?;
        let url = self.table_url(table)?;

        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&vec![row])
            .send()
            .await?;

        let mut rows: Vec<Row> = Self::parse_response(response).await?;
        if rows.is_empty() {
            return Err(BackendError::Decode(format!(
                "Insert into '{table}' returned no row"
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError> {
        require_filters("update", table, filters)?;
        ensure_object(table, &patch)?;
        let url = self.table_url(table)?;

        let response = self
            .request(reqwest::Method::PATCH, url)
            .query(&filter_params(filters)?)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        require_filters("delete", table, filters)?;
        let url = self.table_url(table)?;

        let response = self
            .request(reqwest::Method::DELETE, url)
            .query(&filter_params(filters)?)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<Row> = Self::parse_response(response).await?;
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Direction;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn select_params_include_filters_order_and_limit() {
        let q = Select::table("projects")
            .filter("category", "admin")
            .order_by("created_at", Direction::Desc)
            .order_by("title", Direction::Asc)
            .limit(Some(5));

        assert_eq!(
            select_params(&q).unwrap(),
            vec![
                pair("select", "*"),
                pair("category", "eq.admin"),
                pair("order", "created_at.desc,title.asc"),
                pair("limit", "5"),
            ]
        );
    }

    #[test]
    fn plain_select_only_requests_all_columns() {
        let q = Select::table("categories");
        assert_eq!(select_params(&q).unwrap(), vec![pair("select", "*")]);
    }

    #[test]
    fn boolean_filters_render_as_text() {
        let params = filter_params(&[Filter::eq("hidden", false)]).unwrap();
        assert_eq!(params, vec![pair("hidden", "eq.false")]);
    }

    #[test]
    fn bad_column_names_are_rejected() {
        let q = Select::table("projects").filter("category;--", "x");
        assert!(select_params(&q).is_err());
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let backend = RestBackend::with_client(
            reqwest::Client::new(),
            RestConfig {
                api_url: "https://example.test//".into(),
                anon_key: "anon".into(),
                timeout: DEFAULT_TIMEOUT,
            },
            AuthContext::anonymous(),
        );
        assert_eq!(
            backend.table_url("projects").unwrap(),
            "https://example.test/rest/v1/projects"
        );
        assert!(backend.table_url("Projects").is_err());
    }
}
