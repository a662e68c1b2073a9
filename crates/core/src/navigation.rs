//! Portfolio view navigation state machine.
//!
//! The portfolio has three nested views: the collapsed section on the main
//! page, the full-page all-projects browser, and a single project's detail
//! view. [`Navigator`] tracks the current view, the active category and the
//! last opened project, and returns the [`NavEffect`]s the caller must carry
//! out (prefetching, blocking fetches, scrolling). It performs no I/O itself.

use serde::Serialize;

use crate::types::DbId;

/// The view a project detail was opened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Collapsed,
    AllProjects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "view")]
pub enum View {
    /// Only the active category's preview is shown inline.
    Collapsed,
    /// Full-page browser across all categories.
    AllProjects,
    /// A single project's expanded view.
    ProjectDetail { project_id: DbId, origin: Origin },
}

impl From<Origin> for View {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Collapsed => View::Collapsed,
            Origin::AllProjects => View::AllProjects,
        }
    }
}

/// The project most recently opened in detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastOpened {
    pub project_id: DbId,
    /// Category the project belongs to.
    pub category: String,
    /// Category that was active when the project was opened.
    pub opened_from: Option<String>,
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEffect {
    /// Warm the cache for one category in the background.
    Prefetch(String),
    /// Warm the cache for every category in the background.
    PrefetchAll,
    /// Blocking fetch for a category that is not cached yet.
    Fetch(String),
    CategoryChanged(String),
    ViewChanged(View),
    /// Scroll the project grid so this project is centred.
    ScrollTo(DbId),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    view: View,
    active_category: Option<String>,
    last_opened: Option<LastOpened>,
    section_prefetched: bool,
}

impl Navigator {
    /// Start collapsed with the given initial category (normally the first
    /// visible one).
    pub fn new(active_category: Option<String>) -> Self {
        Self {
            view: View::Collapsed,
            active_category,
            last_opened: None,
            section_prefetched: false,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn last_opened(&self) -> Option<&LastOpened> {
        self.last_opened.as_ref()
    }

    /// Hovering a tab warms its cache without changing state.
    pub fn hover_category(&self, key: &str) -> Vec<NavEffect> {
        vec![NavEffect::Prefetch(key.to_string())]
    }

    /// Make `key` the active category. `cached` tells whether the query cache
    /// already holds its projects; if not, a blocking fetch is requested.
    pub fn select_category(&mut self, key: &str, cached: bool) -> Vec<NavEffect> {
        let mut effects = Vec::new();
        if self.active_category.as_deref() != Some(key) {
            self.active_category = Some(key.to_string());
            effects.push(NavEffect::CategoryChanged(key.to_string()));
        }
        if !cached {
            effects.push(NavEffect::Fetch(key.to_string()));
        }
        effects
    }

    /// "See more": collapsed section to the all-projects browser.
    pub fn see_more(&mut self) -> Vec<NavEffect> {
        match self.view {
            View::Collapsed => {
                self.view = View::AllProjects;
                vec![NavEffect::ViewChanged(self.view), NavEffect::PrefetchAll]
            }
            _ => Vec::new(),
        }
    }

    /// Open a project's detail view from whatever view is current.
    ///
    /// Opening from another detail view keeps the first origin so that
    /// "back" still returns to a list view.
    pub fn open_project(&mut self, project_id: DbId, category: &str) -> Vec<NavEffect> {
        let origin = match self.view {
            View::Collapsed => Origin::Collapsed,
            View::AllProjects => Origin::AllProjects,
            View::ProjectDetail { origin, .. } => origin,
        };
        self.last_opened = Some(LastOpened {
            project_id,
            category: category.to_string(),
            opened_from: self.active_category.clone(),
        });
        self.view = View::ProjectDetail { project_id, origin };
        vec![NavEffect::ViewChanged(self.view)]
    }

    /// Go back one level.
    ///
    /// From a detail view this returns to its origin. If the remembered
    /// project's category differs from the active one, the category is
    /// switched first and then the grid is scrolled to the project.
    ///
    /// `is_listed` reports whether a category can still be shown. When the
    /// project's category no longer can, the category the project was opened
    /// from is restored instead and there is nothing to scroll to.
    /// `is_cached` reports whether a category's projects are already cached.
    pub fn back<L, C>(&mut self, is_listed: L, is_cached: C) -> Vec<NavEffect>
    where
        L: Fn(&str) -> bool,
        C: Fn(&str) -> bool,
    {
        match self.view {
            View::ProjectDetail { origin, .. } => {
                self.view = origin.into();
                let mut effects = vec![NavEffect::ViewChanged(self.view)];
                let Some(last) = self.last_opened.clone() else {
                    return effects;
                };
                let (restore, scroll) = if is_listed(last.category.as_str()) {
                    (Some(last.category), true)
                } else {
                    (last.opened_from.filter(|c| is_listed(c.as_str())), false)
                };
                if let Some(category) = restore {
                    if self.active_category.as_deref() != Some(category.as_str()) {
                        let cached = is_cached(category.as_str());
                        effects.extend(self.select_category(&category, cached));
                    }
                }
                if scroll {
                    effects.push(NavEffect::ScrollTo(last.project_id));
                }
                effects
            }
            View::AllProjects => {
                self.view = View::Collapsed;
                vec![NavEffect::ViewChanged(self.view)]
            }
            View::Collapsed => Vec::new(),
        }
    }

    /// The portfolio section scrolled into the viewport. Fires a full
    /// prefetch the first time only.
    pub fn section_visible(&mut self) -> Vec<NavEffect> {
        if self.section_prefetched {
            return Vec::new();
        }
        self.section_prefetched = true;
        vec![NavEffect::PrefetchAll]
    }
}
