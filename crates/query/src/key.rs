//! Typed query keys.

use std::fmt;

use folio_core::types::DbId;

/// Which project list a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectScope {
    All,
    Category(String),
}

impl ProjectScope {
    pub fn category(key: impl Into<String>) -> Self {
        ProjectScope::Category(key.into())
    }
}

/// Identifies one cached query across every cache of a [`QueryClient`].
///
/// [`QueryClient`]: crate::client::QueryClient
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Category list. Anonymous and owner listings are cached separately.
    Categories { include_hidden: bool },
    Projects(ProjectScope),
    Project(DbId),
    ProjectMedia(DbId),
}

impl QueryKey {
    pub fn category_projects(key: impl Into<String>) -> Self {
        QueryKey::Projects(ProjectScope::category(key))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Categories { include_hidden } => {
                write!(f, "categories[include_hidden={include_hidden}]")
            }
            QueryKey::Projects(ProjectScope::All) => f.write_str("projects[all]"),
            QueryKey::Projects(ProjectScope::Category(key)) => write!(f, "projects[{key}]"),
            QueryKey::Project(id) => write!(f, "project[{id}]"),
            QueryKey::ProjectMedia(id) => write!(f, "project_media[{id}]"),
        }
    }
}
