//! Repository for the `categories` table.

use folio_core::category::sort_visible_first;

use crate::backend::{decode_row, decode_rows, encode_row, Backend, BackendError, Filter, Select};
use crate::models::category::{Category, CreateCategory, UpdateCategory};

pub const TABLE: &str = "categories";

/// Provides CRUD operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List categories, visible first then hidden, each group alphabetical by
    /// display name. Hidden rows are only requested when `include_hidden`.
    pub async fn list(
        backend: &dyn Backend,
        include_hidden: bool,
    ) -> Result<Vec<Category>, BackendError> {
        let mut query = Select::table(TABLE);
        if !include_hidden {
            query = query.filter("hidden", false);
        }
        let mut categories: Vec<Category> = decode_rows(backend.select(&query).await?)?;
        // The backend may not honour the filter for privileged roles.
        if !include_hidden {
            categories.retain(|c| !c.hidden);
        }
        sort_visible_first(&mut categories);
        Ok(categories)
    }

    /// Insert a new category, returning the created row.
    pub async fn create(
        backend: &dyn Backend,
        input: &CreateCategory,
    ) -> Result<Category, BackendError> {
        let mut payload = encode_row(input)?;
        if input.hidden.is_none() {
            payload["hidden"] = false.into();
        }
        decode_row(backend.insert(TABLE, payload).await?)
    }

    /// Update a category by key. Returns `None` if no row matched.
    pub async fn update(
        backend: &dyn Backend,
        key: &str,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, BackendError> {
        let rows = backend
            .update(TABLE, &[Filter::eq("key", key)], encode_row(input)?)
            .await?;
        rows.into_iter().next().map(decode_row).transpose()
    }

    pub async fn set_hidden(
        backend: &dyn Backend,
        key: &str,
        hidden: bool,
    ) -> Result<Option<Category>, BackendError> {
        let input = UpdateCategory {
            hidden: Some(hidden),
            ..Default::default()
        };
        Self::update(backend, key, &input).await
    }

    /// Delete a category by key. Returns `true` if a row was removed.
    pub async fn delete(backend: &dyn Backend, key: &str) -> Result<bool, BackendError> {
        let removed = backend.delete(TABLE, &[Filter::eq("key", key)]).await?;
        Ok(removed > 0)
    }
}
