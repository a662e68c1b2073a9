//! Project media (carousel) model, DTOs and gallery assembly.

use folio_core::media::MediaType;
use folio_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::models::project::Project;

/// A row from the `project_media` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: DbId,
    pub project_id: DbId,
    pub url: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// DTO for attaching media to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMediaItem {
    pub project_id: DbId,
    pub url: String,
    /// Inferred from the URL extension if omitted.
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// One slide of a project's detail carousel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryItem {
    pub url: String,
    pub media_type: MediaType,
    pub alt_text: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Build the display sequence for a project's carousel.
///
/// Media rows are ordered by `sort_order`. With no rows, the project's card
/// image is the only slide; with neither, the gallery is empty.
pub fn gallery(project: &Project, media: &[MediaItem]) -> Vec<GalleryItem> {
    if media.is_empty() {
        if project.image_url.is_empty() {
            return Vec::new();
        }
        return vec![GalleryItem {
            url: project.image_url.clone(),
            media_type: MediaType::Image,
            alt_text: Some(project.title.clone()),
            thumbnail_url: None,
        }];
    }

    let mut ordered: Vec<&MediaItem> = media.iter().collect();
    ordered.sort_by_key(|m| m.sort_order);
    ordered
        .into_iter()
        .map(|m| GalleryItem {
            url: m.url.clone(),
            media_type: m.media_type,
            alt_text: m.alt_text.clone(),
            thumbnail_url: m.thumbnail_url.clone(),
        })
        .collect()
}
