//! The query client: one backend, one auth context, and the caches every
//! portfolio query reads through.
//!
//! A [`QueryClient`] is an explicit object handed to the registry, project
//! queries, mutations and the site orchestrator. Cloning it shares the same
//! caches.

use std::sync::Arc;

use folio_core::types::DbId;
use folio_db::auth::AuthContext;
use folio_db::backend::Backend;
use folio_db::models::category::Category;
use folio_db::models::media::MediaItem;
use folio_db::models::project::Project;

use crate::cache::{QueryCache, QueryStatus};
use crate::config::QueryConfig;
use crate::key::{ProjectScope, QueryKey};
use crate::mutations::Mutations;
use crate::projects::ProjectQueries;
use crate::registry::CategoryRegistry;

#[derive(Clone)]
pub struct QueryClient {
    backend: Arc<dyn Backend>,
    auth: AuthContext,
    config: QueryConfig,
    pub(crate) categories: QueryCache<bool, Vec<Category>>,
    pub(crate) projects: QueryCache<ProjectScope, Vec<Project>>,
    pub(crate) project: QueryCache<DbId, Option<Project>>,
    pub(crate) media: QueryCache<DbId, Vec<MediaItem>>,
}

impl QueryClient {
    pub fn new(backend: Arc<dyn Backend>, auth: AuthContext, config: QueryConfig) -> Self {
        Self {
            backend,
            auth,
            config,
            categories: QueryCache::new(config),
            projects: QueryCache::new(config),
            project: QueryCache::new(config),
            media: QueryCache::new(config),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn registry(&self) -> CategoryRegistry {
        CategoryRegistry::new(self.clone())
    }

    pub fn projects(&self) -> ProjectQueries {
        ProjectQueries::new(self.clone())
    }

    pub fn mutations(&self) -> Mutations {
        Mutations::new(self.clone())
    }

    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        match key {
            QueryKey::Categories { include_hidden } => self.categories.status(include_hidden),
            QueryKey::Projects(scope) => self.projects.status(scope),
            QueryKey::Project(id) => self.project.status(id),
            QueryKey::ProjectMedia(id) => self.media.status(id),
        }
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::Categories { include_hidden } => self.categories.is_cached(include_hidden),
            QueryKey::Projects(scope) => self.projects.is_cached(scope),
            QueryKey::Project(id) => self.project.is_cached(id),
            QueryKey::ProjectMedia(id) => self.media.is_cached(id),
        }
    }

    /// Drop one cached query and detach its in-flight fetch.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::Categories { include_hidden } => self.categories.invalidate(include_hidden),
            QueryKey::Projects(scope) => self.projects.invalidate(scope),
            QueryKey::Project(id) => self.project.invalidate(id),
            QueryKey::ProjectMedia(id) => self.media.invalidate(id),
        }
    }

    /// Drop every cached query whose key matches `predicate`.
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        self.categories.invalidate_where(|include_hidden| {
            predicate(&QueryKey::Categories {
                include_hidden: *include_hidden,
            })
        }) + self
            .projects
            .invalidate_where(|scope| predicate(&QueryKey::Projects(scope.clone())))
            + self
                .project
                .invalidate_where(|id| predicate(&QueryKey::Project(*id)))
            + self
                .media
                .invalidate_where(|id| predicate(&QueryKey::ProjectMedia(*id)))
    }

    /// Drop both category listings, anonymous and owner.
    pub fn invalidate_categories(&self) -> usize {
        self.categories.clear()
    }

    /// Drop every project list, all scopes.
    pub fn invalidate_project_lists(&self) -> usize {
        self.projects.clear()
    }

    pub fn clear(&self) -> usize {
        self.categories.clear() + self.projects.clear() + self.project.clear() + self.media.clear()
    }
}
