//! Project queries: per-category lists, the all-projects list, single
//! projects and their media galleries.
//!
//! The admin-support category is capped at
//! [`ADMIN_SUPPORT_ROW_LIMIT`](folio_core::category_kind::ADMIN_SUPPORT_ROW_LIMIT)
//! rows; every other category returns all of its projects.

use std::sync::Arc;

use folio_core::category_kind::CategoryKind;
use folio_core::types::DbId;
use folio_db::models::media::{gallery, GalleryItem, MediaItem};
use folio_db::models::project::Project;
use folio_db::repositories::{MediaRepo, ProjectRepo};
use futures::future::{BoxFuture, FutureExt};

use crate::cache::QueryResult;
use crate::client::QueryClient;
use crate::error::QueryError;
use crate::key::ProjectScope;

pub struct ProjectQueries {
    client: QueryClient,
}

impl ProjectQueries {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Projects of one category, newest first.
    pub async fn get(&self, category: &str) -> QueryResult<Vec<Project>> {
        let scope = ProjectScope::category(category);
        self.client
            .projects
            .get_or_fetch(scope.clone(), self.list_fetch(scope))
            .await
    }

    /// Every project, newest first.
    pub async fn get_all(&self) -> QueryResult<Vec<Project>> {
        self.client
            .projects
            .get_or_fetch(ProjectScope::All, self.list_fetch(ProjectScope::All))
            .await
    }

    /// Warm one category in the background. Returns `false` if it was
    /// already fresh.
    pub fn prefetch(&self, category: &str) -> bool {
        let scope = ProjectScope::category(category);
        self.client
            .projects
            .prefetch(scope.clone(), self.list_fetch(scope))
    }

    /// Warm every listed category and the all-projects list. Each prefetch
    /// succeeds or fails on its own. Returns how many fetches were started
    /// or joined.
    pub fn prefetch_all<S: AsRef<str>>(&self, categories: &[S]) -> usize {
        let mut started = usize::from(
            self.client
                .projects
                .prefetch(ProjectScope::All, self.list_fetch(ProjectScope::All)),
        );
        for category in categories {
            started += usize::from(self.prefetch(category.as_ref()));
        }
        tracing::debug!(
            categories = categories.len(),
            started,
            "Prefetching all projects"
        );
        started
    }

    /// Whether a category's projects can be read without waiting.
    pub fn is_cached(&self, category: &str) -> bool {
        self.client
            .projects
            .is_cached(&ProjectScope::category(category))
    }

    /// One project, or `None` if it does not exist.
    pub async fn project(&self, id: DbId) -> QueryResult<Option<Project>> {
        let backend = Arc::clone(self.client.backend());
        self.client
            .project
            .get_or_fetch(id, move || async move {
                Ok(ProjectRepo::find_by_id(backend.as_ref(), id).await?)
            })
            .await
    }

    /// A project's media rows in display order.
    pub async fn media(&self, project_id: DbId) -> QueryResult<Vec<MediaItem>> {
        let backend = Arc::clone(self.client.backend());
        self.client
            .media
            .get_or_fetch(project_id, move || async move {
                Ok(MediaRepo::list_for_project(backend.as_ref(), project_id).await?)
            })
            .await
    }

    /// The gallery shown in a project's detail view. Falls back to the cover
    /// image when the project has no media rows.
    pub async fn gallery(&self, project: &Project) -> Result<Vec<GalleryItem>, QueryError> {
        let media = self.media(project.id).await?;
        Ok(gallery(project, &media))
    }

    /// Build the fetch for a project list. The limit is decided by the
    /// category's kind.
    fn list_fetch(
        &self,
        scope: ProjectScope,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<Project>, QueryError>> {
        let backend = Arc::clone(self.client.backend());
        move || {
            async move {
                let projects = match &scope {
                    ProjectScope::All => ProjectRepo::list(backend.as_ref()).await?,
                    ProjectScope::Category(category) => {
                        let limit = CategoryKind::from_key(category).row_limit();
                        ProjectRepo::list_by_category(backend.as_ref(), category, limit).await?
                    }
                };
                tracing::debug!(scope = ?scope, count = projects.len(), "Loaded projects");
                Ok(projects)
            }
            .boxed()
        }
    }
}
