//! Owner-only content mutations.
//!
//! Every mutation requires a signed-in user, validates its input, writes
//! through the backend and, only on success, invalidates the cached queries
//! the write affects. Nothing is applied to the cache optimistically, so a
//! failed write leaves every cached value as it was.

use std::sync::Arc;

use folio_core::error::CoreError;
use folio_core::types::DbId;
use folio_db::backend::Backend;
use folio_db::models::category::{Category, CreateCategory, UpdateCategory};
use folio_db::models::media::{CreateMediaItem, MediaItem};
use folio_db::models::project::{CreateProject, Project, UpdateProject};
use folio_db::repositories::{CategoryRepo, MediaRepo, ProjectRepo};

use crate::client::QueryClient;
use crate::error::QueryError;
use crate::key::{ProjectScope, QueryKey};

pub struct Mutations {
    client: QueryClient,
}

impl Mutations {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, QueryError> {
        let backend = self.authorize()?;
        input.validate()?;
        let category = CategoryRepo::create(backend.as_ref(), input).await?;
        self.client.invalidate_categories();
        tracing::info!(category = %category.key, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        key: &str,
        input: &UpdateCategory,
    ) -> Result<Category, QueryError> {
        let backend = self.authorize()?;
        input.validate()?;
        let category = CategoryRepo::update(backend.as_ref(), key, input)
            .await?
            .ok_or_else(|| category_not_found(key))?;
        self.client.invalidate_categories();
        tracing::info!(category = %key, "Category updated");
        Ok(category)
    }

    /// Hide or reveal a category. Hidden categories disappear from the
    /// visitor listing but stay in the owner's.
    pub async fn set_category_hidden(
        &self,
        key: &str,
        hidden: bool,
    ) -> Result<Category, QueryError> {
        let backend = self.authorize()?;
        let category = CategoryRepo::set_hidden(backend.as_ref(), key, hidden)
            .await?
            .ok_or_else(|| category_not_found(key))?;
        self.client.invalidate_categories();
        tracing::info!(category = %key, hidden, "Category visibility changed");
        Ok(category)
    }

    pub async fn delete_category(&self, key: &str) -> Result<(), QueryError> {
        let backend = self.authorize()?;
        if !CategoryRepo::delete(backend.as_ref(), key).await? {
            return Err(category_not_found(key));
        }
        self.client.invalidate_categories();
        self.client.invalidate(&QueryKey::category_projects(key));
        tracing::info!(category = %key, "Category deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn create_project(&self, input: &CreateProject) -> Result<Project, QueryError> {
        let backend = self.authorize()?;
        input.validate()?;
        let project = ProjectRepo::create(backend.as_ref(), input).await?;
        self.client.invalidate(&QueryKey::Projects(ProjectScope::All));
        self.client
            .invalidate(&QueryKey::category_projects(&project.category));
        tracing::info!(project_id = %project.id, category = %project.category, "Project created");
        Ok(project)
    }

    /// Update a project. Every project list is invalidated since the
    /// category may have changed.
    pub async fn update_project(
        &self,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Project, QueryError> {
        let backend = self.authorize()?;
        input.validate()?;
        let project = ProjectRepo::update(backend.as_ref(), id, input)
            .await?
            .ok_or_else(|| project_not_found(id))?;
        self.client.invalidate_project_lists();
        self.client.invalidate(&QueryKey::Project(id));
        tracing::info!(project_id = %id, "Project updated");
        Ok(project)
    }

    /// Delete a project and its media. Backends that cascade the delete
    /// leave no media behind, so the second step removes nothing there.
    pub async fn delete_project(&self, id: DbId) -> Result<(), QueryError> {
        let backend = self.authorize()?;
        if !ProjectRepo::delete(backend.as_ref(), id).await? {
            return Err(project_not_found(id));
        }
        let media_removed = MediaRepo::delete_for_project(backend.as_ref(), id).await?;
        self.client.invalidate_project_lists();
        self.client.invalidate(&QueryKey::Project(id));
        self.client.invalidate(&QueryKey::ProjectMedia(id));
        tracing::info!(project_id = %id, media_removed, "Project deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    pub async fn add_media(&self, input: &CreateMediaItem) -> Result<MediaItem, QueryError> {
        let backend = self.authorize()?;
        folio_core::project::validate_link(&input.url)?;
        let item = MediaRepo::create(backend.as_ref(), input).await?;
        self.client
            .invalidate(&QueryKey::ProjectMedia(input.project_id));
        tracing::info!(project_id = %input.project_id, media_id = %item.id, "Media added");
        Ok(item)
    }

    pub async fn delete_media(&self, project_id: DbId, media_id: DbId) -> Result<(), QueryError> {
        let backend = self.authorize()?;
        if !MediaRepo::delete(backend.as_ref(), media_id).await? {
            return Err(QueryError::Core(CoreError::NotFound {
                entity: "MediaItem",
                id: media_id.to_string(),
            }));
        }
        self.client.invalidate(&QueryKey::ProjectMedia(project_id));
        tracing::info!(project_id = %project_id, media_id = %media_id, "Media deleted");
        Ok(())
    }

    // ---- private helpers ----

    /// The backend to write through, once a user is signed in.
    fn authorize(&self) -> Result<Arc<dyn Backend>, QueryError> {
        let user = self.client.auth().require_user()?;
        tracing::debug!(user_id = %user.id, "Authorized mutation");
        Ok(Arc::clone(self.client.backend()))
    }
}

fn category_not_found(key: &str) -> QueryError {
    QueryError::Core(CoreError::NotFound {
        entity: "Category",
        id: key.to_string(),
    })
}

fn project_not_found(id: DbId) -> QueryError {
    QueryError::Core(CoreError::NotFound {
        entity: "Project",
        id: id.to_string(),
    })
}
