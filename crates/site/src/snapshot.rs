//! Serializable picture of what the portfolio section would render.

use folio_core::category_kind::CategoryIcon;
use folio_core::navigation::View;
use folio_core::project::CategoryGroup;
use folio_db::models::project::Project;
use folio_query::QueryError;
use serde::Serialize;

use crate::orchestrator::{Orchestrator, ProjectPreview};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTab {
    pub key: String,
    pub name: String,
    pub badge: Option<String>,
    pub icon: CategoryIcon,
    pub hidden: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSnapshot {
    pub view: View,
    pub tabs: Vec<CategoryTab>,
    pub preview: ProjectPreview,
    /// Only filled in the all-projects view.
    pub groups: Vec<CategoryGroup<Project>>,
}

impl PortfolioSnapshot {
    pub async fn capture(orchestrator: &Orchestrator) -> Result<Self, QueryError> {
        let active = orchestrator.active_category();
        let tabs = orchestrator
            .categories()
            .into_iter()
            .map(|c| CategoryTab {
                active: active.as_deref() == Some(c.key.as_str()),
                icon: c.icon(),
                key: c.key,
                name: c.name,
                badge: c.badge,
                hidden: c.hidden,
            })
            .collect();

        let view = orchestrator.view();
        let groups = match view {
            View::AllProjects => orchestrator.grouped_projects().await?,
            _ => Vec::new(),
        };

        Ok(Self {
            view,
            tabs,
            preview: orchestrator.visible_projects().await?,
            groups,
        })
    }
}
