//! In-process adapter implementing both repository ports.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! staged copy; `commit` swaps the copy in, dropping the handle discards it.
//! The store enforces the same unique-slug, foreign-key and ready-rendition
//! rules as the Postgres schema.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vellum_model::{
    ContentItem, ContentItemID, ContentItemQuery, MediaAsset, MediaAssetID,
    MediaAssetQuery, OwnerID, OwnershipScope, Page,
};

use crate::{
    database::ports::{
        content_items::{ContentItemRepository, ContentItemTransaction},
        media_assets::{
            AssetLookup, MediaAssetRepository, MediaAssetTransaction,
        },
    },
    error::{CatalogError, Result},
    query::{
        ContentItemListing, MediaAssetListing, ScopePredicate,
        memory::paginate,
    },
};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    assets: HashMap<MediaAssetID, MediaAsset>,
    items: HashMap<ContentItemID, ContentItem>,
}

impl CatalogState {
    fn live_asset(&self, id: MediaAssetID, owner_id: OwnerID) -> Option<&MediaAsset> {
        self.assets
            .get(&id)
            .filter(|asset| asset.owner_id == owner_id && !asset.is_deleted())
    }

    fn live_item(&self, id: ContentItemID, owner_id: OwnerID) -> Option<&ContentItem> {
        self.items
            .get(&id)
            .filter(|item| item.owner_id == owner_id && !item.is_deleted())
    }

    fn slug_taken(
        &self,
        scope: &OwnershipScope,
        slug: &str,
        excluding: Option<ContentItemID>,
    ) -> bool {
        self.items.values().any(|item| {
            !item.is_deleted()
                && Some(item.id) != excluding
                && scope.contains(item.owner_id, item.organization_id)
                && item.slug == slug
        })
    }

    fn put_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset> {
        if !asset.rendition_consistent() {
            return Err(CatalogError::validation(
                "status",
                "a ready asset needs a playlist, a thumbnail and a duration",
            ));
        }
        self.assets.insert(asset.id, asset.clone());
        Ok(asset.clone())
    }

    fn put_item(&mut self, item: &ContentItem) -> Result<ContentItem> {
        if item.kind.requires_media() != item.media_asset_id.is_some() {
            return Err(CatalogError::validation(
                "media_asset_id",
                "media reference does not match the content kind",
            ));
        }
        if let Some(asset_id) = item.media_asset_id
            && !self.assets.contains_key(&asset_id)
        {
            return Err(CatalogError::media_asset_not_found(asset_id));
        }
        if !item.is_deleted() {
            let scope = OwnershipScope {
                owner_id: item.owner_id,
                organization_id: item.organization_id,
            };
            if self.slug_taken(&scope, &item.slug, Some(item.id)) {
                return Err(CatalogError::SlugConflict {
                    slug: item.slug.clone(),
                });
            }
        }
        self.items.insert(item.id, item.clone());
        Ok(item.clone())
    }
}

/// Process-local catalog store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transaction(&self) -> MemoryTransaction {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        MemoryTransaction { guard, staged }
    }
}

/// Exclusive handle over a staged copy of the store.
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    staged: CatalogState,
}

impl MemoryTransaction {
    fn apply(mut self) {
        *self.guard = self.staged;
    }
}

#[async_trait]
impl MediaAssetRepository for MemoryCatalog {
    async fn begin(&self) -> Result<Box<dyn MediaAssetTransaction>> {
        Ok(Box::new(self.transaction().await))
    }

    async fn find_asset(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        let state = self.state.lock().await;
        Ok(state.live_asset(id, owner_id).cloned())
    }

    async fn list_assets(
        &self,
        owner_id: OwnerID,
        query: &MediaAssetQuery,
    ) -> Result<Page<MediaAsset>> {
        let state = self.state.lock().await;
        Ok(paginate::<MediaAssetListing>(
            state.assets.values(),
            &ScopePredicate::owner(owner_id),
            query,
            query.page,
        ))
    }
}

#[async_trait]
impl ContentItemRepository for MemoryCatalog {
    async fn begin(&self) -> Result<Box<dyn ContentItemTransaction>> {
        Ok(Box::new(self.transaction().await))
    }

    async fn list_items(
        &self,
        scope: &OwnershipScope,
        query: &ContentItemQuery,
    ) -> Result<Page<ContentItem>> {
        let state = self.state.lock().await;
        Ok(paginate::<ContentItemListing>(
            state.items.values(),
            &ScopePredicate::scoped(scope),
            query,
            query.page,
        ))
    }
}

#[async_trait]
impl AssetLookup for MemoryTransaction {
    async fn lookup_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        Ok(self.staged.live_asset(id, owner_id).cloned())
    }
}

#[async_trait]
impl MediaAssetTransaction for MemoryTransaction {
    async fn lock_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        Ok(self.staged.live_asset(id, owner_id).cloned())
    }

    async fn insert_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset> {
        if self.staged.assets.contains_key(&asset.id) {
            return Err(CatalogError::Internal(format!(
                "Failed to create media asset: duplicate id {}",
                asset.id
            )));
        }
        self.staged.put_asset(asset)
    }

    async fn update_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset> {
        if self.staged.live_asset(asset.id, asset.owner_id).is_none() {
            return Err(CatalogError::media_asset_not_found(asset.id));
        }
        self.staged.put_asset(asset)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.apply();
        Ok(())
    }
}

#[async_trait]
impl ContentItemTransaction for MemoryTransaction {
    async fn find_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>> {
        Ok(self.staged.live_item(id, owner_id).cloned())
    }

    async fn lock_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>> {
        Ok(self.staged.live_item(id, owner_id).cloned())
    }

    async fn slug_in_use(
        &mut self,
        scope: &OwnershipScope,
        slug: &str,
        excluding: Option<ContentItemID>,
    ) -> Result<bool> {
        Ok(self.staged.slug_taken(scope, slug, excluding))
    }

    async fn insert_item(&mut self, item: &ContentItem) -> Result<ContentItem> {
        if self.staged.items.contains_key(&item.id) {
            return Err(CatalogError::Internal(format!(
                "Failed to create content item: duplicate id {}",
                item.id
            )));
        }
        self.staged.put_item(item)
    }

    async fn update_item(&mut self, item: &ContentItem) -> Result<ContentItem> {
        if self.staged.live_item(item.id, item.owner_id).is_none() {
            return Err(CatalogError::content_item_not_found(item.id));
        }
        self.staged.put_item(item)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.apply();
        Ok(())
    }
}
