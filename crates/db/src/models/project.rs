//! Project entity model and DTOs.

use folio_core::category_kind::CategoryKind;
use folio_core::error::CoreError;
use folio_core::project::{split_skills, validate_link, validate_title};
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `projects` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    /// Key of the category this project is listed under.
    pub category: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Comma-joined skills; see [`Project::skills_list`].
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub results: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn skills_list(&self) -> Vec<String> {
        split_skills(&self.skills)
    }

    pub fn category_kind(&self) -> CategoryKind {
        CategoryKind::from_key(&self.category)
    }

    /// Whether any of the extended narrative fields is filled in.
    pub fn has_case_study(&self) -> bool {
        [&self.problem, &self.solution, &self.process, &self.outcome]
            .iter()
            .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub category: String,
    pub caption: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub skills: String,
    pub results: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl CreateProject {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_title(&self.title)?;
        if self.category.trim().is_empty() {
            return Err(CoreError::Validation(
                "Project category must not be empty".to_string(),
            ));
        }
        if let Some(link) = &self.link {
            validate_link(link)?;
        }
        Ok(())
    }
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl UpdateProject {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(link) = &self.link {
            validate_link(link)?;
        }
        Ok(())
    }
}
