//! Well-known category keys and their display icons.
//!
//! Category keys are free-form slugs in the backend. The handful the site
//! treats specially are mapped to [`CategoryKind`]; everything else is
//! [`CategoryKind::Other`] and renders with the fallback icon.

use serde::Serialize;

/// Key of the administrative support category.
pub const ADMIN_SUPPORT_KEY: &str = "admin";

/// Maximum number of projects returned for the administrative support
/// category, regardless of how many rows exist.
pub const ADMIN_SUPPORT_ROW_LIMIT: usize = 5;

/// Categories with dedicated presentation or query rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    AdminSupport,
    Design,
    Development,
    Marketing,
    Writing,
    Video,
    Other,
}

/// Icons available for category tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryIcon {
    Briefcase,
    Palette,
    Code,
    Megaphone,
    Pen,
    Film,
    Folder,
}

impl CategoryKind {
    /// Map a category key to its kind. Unknown keys map to `Other`.
    pub fn from_key(key: &str) -> Self {
        match key {
            ADMIN_SUPPORT_KEY => Self::AdminSupport,
            "design" => Self::Design,
            "development" => Self::Development,
            "marketing" => Self::Marketing,
            "writing" => Self::Writing,
            "video" => Self::Video,
            _ => Self::Other,
        }
    }

    pub fn icon(&self) -> CategoryIcon {
        match self {
            Self::AdminSupport => CategoryIcon::Briefcase,
            Self::Design => CategoryIcon::Palette,
            Self::Development => CategoryIcon::Code,
            Self::Marketing => CategoryIcon::Megaphone,
            Self::Writing => CategoryIcon::Pen,
            Self::Video => CategoryIcon::Film,
            Self::Other => CategoryIcon::Folder,
        }
    }

    /// Row cap applied when listing projects of this kind.
    pub fn row_limit(&self) -> Option<usize> {
        match self {
            Self::AdminSupport => Some(ADMIN_SUPPORT_ROW_LIMIT),
            _ => None,
        }
    }
}

impl CategoryIcon {
    /// Icon identifier understood by the front-end icon set.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Briefcase => "briefcase",
            Self::Palette => "palette",
            Self::Code => "code",
            Self::Megaphone => "megaphone",
            Self::Pen => "pen",
            Self::Film => "film",
            Self::Folder => "folder",
        }
    }
}

/// Shorthand for `CategoryKind::from_key(key).icon()`.
pub fn icon_for_key(key: &str) -> CategoryIcon {
    CategoryKind::from_key(key).icon()
}
