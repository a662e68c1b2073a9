//! Category entity model and DTOs.

use folio_core::category::{validate_category_key, validate_category_name, CategoryEntry};
use folio_core::category_kind::{CategoryIcon, CategoryKind};
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `categories` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub created_at: Timestamp,
}

impl Category {
    pub fn kind(&self) -> CategoryKind {
        CategoryKind::from_key(&self.key)
    }

    pub fn icon(&self) -> CategoryIcon {
        self.kind().icon()
    }
}

impl CategoryEntry for Category {
    fn key(&self) -> &str {
        &self.key
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// DTO for creating a new category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Defaults to visible if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl CreateCategory {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_category_key(&self.key)?;
        validate_category_name(&self.name)
    }
}

/// DTO for updating a category. The key is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the badge; `None` leaves it unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl UpdateCategory {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_category_name(name)?;
        }
        Ok(())
    }
}
