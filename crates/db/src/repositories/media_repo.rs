//! Repository for the `project_media` table.

use folio_core::media::MediaType;
use folio_core::types::DbId;
use serde_json::json;

use crate::backend::{decode_row, decode_rows, Backend, BackendError, Direction, Filter, Select};
use crate::models::media::{CreateMediaItem, MediaItem};

pub const TABLE: &str = "project_media";

/// Provides CRUD operations for project media.
pub struct MediaRepo;

impl MediaRepo {
    /// List a project's media in display order.
    pub async fn list_for_project(
        backend: &dyn Backend,
        project_id: DbId,
    ) -> Result<Vec<MediaItem>, BackendError> {
        let query = Select::table(TABLE)
            .filter("project_id", project_id.to_string())
            .order_by("sort_order", Direction::Asc);
        decode_rows(backend.select(&query).await?)
    }

    /// Attach a media item. A missing media type is inferred from the URL;
    /// a missing sort order defaults to 0.
    pub async fn create(
        backend: &dyn Backend,
        input: &CreateMediaItem,
    ) -> Result<MediaItem, BackendError> {
        let media_type = input
            .media_type
            .unwrap_or_else(|| MediaType::infer_from_url(&input.url));
        let payload = json!({
            "project_id": input.project_id,
            "url": input.url,
            "media_type": media_type,
            "alt_text": input.alt_text,
            "thumbnail_url": input.thumbnail_url,
            "sort_order": input.sort_order.unwrap_or(0),
        });
        decode_row(backend.insert(TABLE, payload).await?)
    }

    /// Delete a media item by ID. Returns `true` if a row was removed.
    pub async fn delete(backend: &dyn Backend, id: DbId) -> Result<bool, BackendError> {
        let removed = backend
            .delete(TABLE, &[Filter::eq("id", id.to_string())])
            .await?;
        Ok(removed > 0)
    }

    /// Delete every media item of a project. Returns how many were removed.
    pub async fn delete_for_project(
        backend: &dyn Backend,
        project_id: DbId,
    ) -> Result<u64, BackendError> {
        backend
            .delete(TABLE, &[Filter::eq("project_id", project_id.to_string())])
            .await
    }
}
