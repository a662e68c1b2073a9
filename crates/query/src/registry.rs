//! Category registry: the ordered, visibility-filtered category list the
//! portfolio tabs are built from.

use std::sync::Arc;

use folio_db::models::category::Category;
use folio_db::repositories::CategoryRepo;

use crate::cache::QueryResult;
use crate::client::QueryClient;

pub struct CategoryRegistry {
    client: QueryClient,
}

impl CategoryRegistry {
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Visible categories first, then hidden ones, each group alphabetical
    /// by display name. Hidden categories are only requested when
    /// `include_hidden` is set. An empty table yields an empty list.
    pub async fn load_categories(&self, include_hidden: bool) -> QueryResult<Vec<Category>> {
        let backend = Arc::clone(self.client.backend());
        self.client
            .categories
            .get_or_fetch(include_hidden, move || async move {
                let categories = CategoryRepo::list(backend.as_ref(), include_hidden).await?;
                tracing::debug!(
                    include_hidden,
                    count = categories.len(),
                    "Loaded categories"
                );
                Ok(categories)
            })
            .await
    }

    /// Load the listing appropriate for the current session: the owner sees
    /// hidden categories, visitors do not.
    pub async fn load_for_session(&self) -> QueryResult<Vec<Category>> {
        self.load_categories(self.client.auth().is_authenticated())
            .await
    }

    /// The category selected when the portfolio first renders.
    pub fn default_category(categories: &[Category]) -> Option<&Category> {
        folio_core::category::default_category(categories)
    }
}
