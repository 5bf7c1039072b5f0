use async_trait::async_trait;
use vellum_model::{
    ContentItem, ContentItemID, ContentItemQuery, OwnerID, OwnershipScope, Page,
};

use super::media_assets::AssetLookup;
use crate::error::Result;

/// Unit of work over content item rows. Asset lookups made through the same
/// handle see the asset as of this transaction and keep it from changing
/// until commit.
#[async_trait]
pub trait ContentItemTransaction: AssetLookup + Send {
    async fn find_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>>;

    /// Scoped fetch that also locks the row for the rest of the transaction.
    async fn lock_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>>;

    /// Whether a live item in `scope` already uses `slug`, ignoring
    /// `excluding` (the item being renamed).
    async fn slug_in_use(
        &mut self,
        scope: &OwnershipScope,
        slug: &str,
        excluding: Option<ContentItemID>,
    ) -> Result<bool>;

    /// Inserts the row. A scoped-slug collision surfaces as
    /// `CatalogError::SlugConflict` even when it slipped past `slug_in_use`.
    async fn insert_item(&mut self, item: &ContentItem) -> Result<ContentItem>;

    /// Persists every mutable column of `item` and returns the stored row.
    async fn update_item(&mut self, item: &ContentItem) -> Result<ContentItem>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait ContentItemRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ContentItemTransaction>>;

    async fn list_items(
        &self,
        scope: &OwnershipScope,
        query: &ContentItemQuery,
    ) -> Result<Page<ContentItem>>;
}
