//! Repository for the `projects` table.

use folio_core::types::DbId;

use crate::backend::{
    decode_row, decode_rows, encode_row, Backend, BackendError, Direction, Filter, Select,
};
use crate::models::project::{CreateProject, Project, UpdateProject};

pub const TABLE: &str = "projects";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// List all projects, newest first.
    pub async fn list(backend: &dyn Backend) -> Result<Vec<Project>, BackendError> {
        let query = Select::table(TABLE).order_by("created_at", Direction::Desc);
        decode_rows(backend.select(&query).await?)
    }

    /// List the projects of one category, newest first, optionally capped.
    pub async fn list_by_category(
        backend: &dyn Backend,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Project>, BackendError> {
        let query = Select::table(TABLE)
            .filter("category", category)
            .order_by("created_at", Direction::Desc)
            .limit(limit);
        decode_rows(backend.select(&query).await?)
    }

    pub async fn find_by_id(
        backend: &dyn Backend,
        id: DbId,
    ) -> Result<Option<Project>, BackendError> {
        let query = Select::table(TABLE)
            .filter("id", id.to_string())
            .limit(Some(1));
        let rows = backend.select(&query).await?;
        rows.into_iter().next().map(decode_row).transpose()
    }

    /// Insert a new project, returning the created row.
    pub async fn create(
        backend: &dyn Backend,
        input: &CreateProject,
    ) -> Result<Project, BackendError> {
        decode_row(backend.insert(TABLE, encode_row(input)?).await?)
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        backend: &dyn Backend,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, BackendError> {
        let rows = backend
            .update(TABLE, &[Filter::eq("id", id.to_string())], encode_row(input)?)
            .await?;
        rows.into_iter().next().map(decode_row).transpose()
    }

    /// Delete a project by ID. Returns `true` if a row was removed.
    pub async fn delete(backend: &dyn Backend, id: DbId) -> Result<bool, BackendError> {
        let removed = backend
            .delete(TABLE, &[Filter::eq("id", id.to_string())])
            .await?;
        Ok(removed > 0)
    }
}
