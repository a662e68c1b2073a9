//! Ties portfolio navigation to the query cache.
//!
//! The [`Orchestrator`] owns a [`Navigator`] and carries out the effects each
//! transition returns: background prefetches (failures are logged and
//! swallowed), blocking fetches (failures are returned), and navigation
//! events published on the [`NavigationBus`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use folio_core::category::default_category;
use folio_core::error::CoreError;
use folio_core::navigation::{LastOpened, NavEffect, Navigator, View};
use folio_core::project::{group_by_category, CategoryGroup};
use folio_core::types::DbId;
use folio_db::models::category::Category;
use folio_db::models::media::GalleryItem;
use folio_db::models::project::Project;
use folio_query::{QueryClient, QueryError};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::DEFAULT_PREVIEW_LIMIT;
use crate::events::{NavigationBus, NavigationEvent};

/// Projects shown for the active category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPreview {
    /// `None` when there are no categories at all.
    pub category: Option<String>,
    pub projects: Vec<Project>,
    /// How many projects the category holds in total.
    pub total: usize,
}

impl ProjectPreview {
    /// Nothing to show: render the empty state.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// More projects exist than are shown.
    pub fn has_more(&self) -> bool {
        self.total > self.projects.len()
    }
}

/// Everything the detail view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub gallery: Vec<GalleryItem>,
}

pub struct Orchestrator {
    client: QueryClient,
    navigator: Mutex<Navigator>,
    categories: Mutex<Vec<Category>>,
    events: NavigationBus,
    preview_limit: usize,
}

impl Orchestrator {
    /// Start collapsed on the first visible category of `categories`.
    pub fn new(client: QueryClient, categories: Vec<Category>) -> Self {
        let initial = default_category(&categories).map(|c| c.key.clone());
        Self {
            client,
            navigator: Mutex::new(Navigator::new(initial)),
            categories: Mutex::new(categories),
            events: NavigationBus::default(),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }

    /// Load the session's categories through the registry, then start.
    pub async fn load(client: QueryClient) -> Result<Self, QueryError> {
        let categories = client.registry().load_for_session().await?;
        tracing::info!(count = categories.len(), "Portfolio categories loaded");
        Ok(Self::new(client, categories.to_vec()))
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    pub fn view(&self) -> View {
        self.navigator().view()
    }

    pub fn active_category(&self) -> Option<String> {
        self.navigator().active_category().map(str::to_string)
    }

    pub fn last_opened(&self) -> Option<LastOpened> {
        self.navigator().last_opened().cloned()
    }

    /// Categories in registry order.
    pub fn categories(&self) -> Vec<Category> {
        self.lock_categories().clone()
    }

    /// Reload categories after owner edits. The active category is kept
    /// even if it was hidden; selecting another one is up to the caller.
    pub async fn refresh_categories(&self) -> Result<(), QueryError> {
        let categories = self.client.registry().load_for_session().await?;
        *self.lock_categories() = categories.to_vec();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Pointer entered a category tab. Keys outside the session's category
    /// list are rejected.
    pub fn hover_category(&self, key: &str) -> Result<(), QueryError> {
        self.require_listed(key)?;
        let effects = self.navigator().hover_category(key);
        self.apply_background(effects);
        Ok(())
    }

    /// Switch the active category. Blocks on a fetch only when the category
    /// is not cached yet; that fetch's error is returned. Keys outside the
    /// session's category list are rejected before anything changes.
    pub async fn select_category(&self, key: &str) -> Result<(), QueryError> {
        self.require_listed(key)?;
        let cached = self.client.projects().is_cached(key);
        let effects = self.navigator().select_category(key, cached);
        self.apply(effects).await
    }

    /// Expand the collapsed section into the all-projects browser.
    pub fn see_more(&self) {
        let effects = self.navigator().see_more();
        self.apply_background(effects);
    }

    /// Open a project's detail view. The project's category must be one the
    /// session lists, so visitors cannot open projects of hidden categories.
    pub fn open_project(&self, project_id: DbId, category: &str) -> Result<(), QueryError> {
        self.require_listed(category)?;
        let effects = self.navigator().open_project(project_id, category);
        self.apply_background(effects);
        Ok(())
    }

    /// Leave the detail view (restoring the project's category and
    /// scrolling to it) or the all-projects browser. If the project's
    /// category has left the session's list since it was opened, the
    /// category it was opened from is restored instead.
    pub async fn back(&self) -> Result<(), QueryError> {
        let projects = self.client.projects();
        let listed = self.category_keys();
        let effects = self.navigator().back(
            |key| listed.iter().any(|k| k == key),
            |key| projects.is_cached(key),
        );
        self.apply(effects).await
    }

    /// The portfolio section scrolled into view.
    pub fn section_visible(&self) {
        let effects = self.navigator().section_visible();
        self.apply_background(effects);
    }

    /// Ask the UI to show the add-category form. Owner only.
    pub fn request_add_category(&self) -> Result<(), QueryError> {
        self.client.auth().require_user()?;
        self.events.publish(NavigationEvent::AddCategoryRequested);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // View models
    // -----------------------------------------------------------------------

    /// The active category's projects. The collapsed view shows at most the
    /// preview limit; other views show them all.
    pub async fn visible_projects(&self) -> Result<ProjectPreview, QueryError> {
        let (category, view) = {
            let navigator = self.navigator();
            (navigator.active_category().map(str::to_string), navigator.view())
        };
        let Some(category) = category else {
            return Ok(ProjectPreview {
                category: None,
                projects: Vec::new(),
                total: 0,
            });
        };

        let projects = self.client.projects().get(&category).await?;
        let total = projects.len();
        let shown = match view {
            View::Collapsed => projects.iter().take(self.preview_limit).cloned().collect(),
            _ => projects.to_vec(),
        };
        Ok(ProjectPreview {
            category: Some(category),
            projects: shown,
            total,
        })
    }

    /// Every project grouped by category in registry order.
    ///
    /// The owner also gets a trailing ungrouped bucket of projects whose
    /// category no longer exists. Visitors never do: their category list
    /// omits hidden categories, so the bucket would expose those projects.
    pub async fn grouped_projects(&self) -> Result<Vec<CategoryGroup<Project>>, QueryError> {
        let projects = self.client.projects().get_all().await?;
        let order = self.category_keys();
        let mut groups = group_by_category(
            &order,
            projects.to_vec(),
            |p: &Project| p.category.as_str(),
        );
        if !self.client.auth().is_authenticated() {
            groups.retain(|g| g.category.is_some());
        }
        Ok(groups)
    }

    /// The project open in the detail view, with its gallery.
    pub async fn project_detail(&self) -> Result<Option<ProjectDetail>, QueryError> {
        let View::ProjectDetail { project_id, .. } = self.view() else {
            return Ok(None);
        };
        let queries = self.client.projects();
        let Some(project) = (*queries.project(project_id).await?).clone() else {
            return Ok(None);
        };
        let gallery = queries.gallery(&project).await?;
        Ok(Some(ProjectDetail { project, gallery }))
    }

    // ---- private helpers ----

    fn navigator(&self) -> MutexGuard<'_, Navigator> {
        self.navigator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_categories(&self) -> MutexGuard<'_, Vec<Category>> {
        self.categories.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_listed(&self, key: &str) -> Result<(), QueryError> {
        if self.lock_categories().iter().any(|c| c.key == key) {
            return Ok(());
        }
        tracing::debug!(category = %key, "Rejected category outside the session's list");
        Err(QueryError::Core(CoreError::NotFound {
            entity: "Category",
            id: key.to_string(),
        }))
    }

    fn category_keys(&self) -> Vec<String> {
        self.lock_categories().iter().map(|c| c.key.clone()).collect()
    }

    /// Carry out effects in order. Every event is published even when a
    /// blocking fetch fails; the first fetch error is returned.
    async fn apply(&self, effects: Vec<NavEffect>) -> Result<(), QueryError> {
        let mut first_error = None;
        for effect in effects {
            if let NavEffect::Fetch(category) = &effect {
                if let Err(err) = self.client.projects().get(category).await {
                    tracing::debug!(category = %category, error = %err, "Blocking fetch failed");
                    first_error.get_or_insert(err);
                }
            } else {
                self.apply_one(effect);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Carry out effects that never block.
    fn apply_background(&self, effects: Vec<NavEffect>) {
        for effect in effects {
            self.apply_one(effect);
        }
    }

    fn apply_one(&self, effect: NavEffect) {
        match effect {
            NavEffect::Prefetch(category) => {
                self.client.projects().prefetch(&category);
            }
            NavEffect::PrefetchAll => {
                self.client.projects().prefetch_all(&self.category_keys());
            }
            NavEffect::Fetch(category) => {
                // Background transitions never block; warm the cache instead.
                self.client.projects().prefetch(&category);
            }
            NavEffect::CategoryChanged(category) => {
                self.events
                    .publish(NavigationEvent::CategoryChanged { category });
            }
            NavEffect::ViewChanged(view) => {
                self.events.publish(NavigationEvent::ViewChanged { view });
            }
            NavEffect::ScrollTo(project_id) => {
                self.events.publish(NavigationEvent::ScrollTo { project_id });
            }
        }
    }
}
