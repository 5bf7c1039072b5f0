use async_trait::async_trait;
use vellum_model::{MediaAsset, MediaAssetID, MediaAssetQuery, OwnerID, Page};

use crate::error::Result;

/// Narrow read capability the content side uses to validate references.
///
/// Returns `None` for missing, soft-deleted and foreign assets. When
/// implemented by a transaction handle the returned row stays stable until
/// that transaction ends.
#[async_trait]
pub trait AssetLookup: Send {
    async fn lookup_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>>;
}

/// Unit of work over media asset rows.
#[async_trait]
pub trait MediaAssetTransaction: Send {
    /// Scoped fetch that also locks the row for the rest of the transaction.
    async fn lock_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>>;

    async fn insert_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset>;

    /// Persists every mutable column of `asset` and returns the stored row.
    async fn update_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait MediaAssetRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn MediaAssetTransaction>>;

    async fn find_asset(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>>;

    async fn list_assets(
        &self,
        owner_id: OwnerID,
        query: &MediaAssetQuery,
    ) -> Result<Page<MediaAsset>>;
}
