//! Shared harness for catalog integration tests.
#![allow(dead_code)]

use anyhow::Result;
use vellum_core::model::{
    ContentItem, ContentKind, MediaAsset, MediaAssetID, MediaAssetStatus,
    MediaKind, NewContentItem, NewMediaAsset, OwnerID, OwnershipScope,
    ReadyRendition,
};
use vellum_core::{CatalogServices, PageLimits};

/// Services plus a few shortcuts for driving assets through the pipeline.
pub struct CatalogHarness {
    pub services: CatalogServices,
}

impl CatalogHarness {
    pub fn in_memory() -> Self {
        Self::in_memory_with_limits(PageLimits::default())
    }

    pub fn in_memory_with_limits(limits: PageLimits) -> Self {
        Self {
            services: CatalogServices::in_memory(limits),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let catalog = vellum_core::PostgresCatalog::from_pool(pool);
        Self {
            services: CatalogServices::postgres(&catalog, PageLimits::default()),
        }
    }

    pub async fn upload(
        &self,
        owner_id: OwnerID,
        kind: MediaKind,
    ) -> Result<MediaAsset> {
        let (storage_key, mime_type) = match kind {
            MediaKind::Video => ("originals/clip.mp4", "video/mp4"),
            MediaKind::Audio => ("originals/episode.mp3", "audio/mpeg"),
        };
        let asset = self
            .services
            .media_assets
            .register_upload(
                NewMediaAsset {
                    kind,
                    storage_key: storage_key.to_string(),
                    file_size: 1_048_576,
                    mime_type: mime_type.to_string(),
                    title: None,
                    description: None,
                },
                owner_id,
            )
            .await?;
        Ok(asset)
    }

    /// Walks an uploaded asset up to `transcoding`.
    pub async fn start_transcoding(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        let assets = &self.services.media_assets;
        assets
            .transition_status(id, MediaAssetStatus::Uploaded, owner_id)
            .await?;
        let asset = assets
            .transition_status(id, MediaAssetStatus::Transcoding, owner_id)
            .await?;
        Ok(asset)
    }

    pub async fn ready_asset(
        &self,
        owner_id: OwnerID,
        kind: MediaKind,
    ) -> Result<MediaAsset> {
        let asset = self.upload(owner_id, kind).await?;
        self.start_transcoding(asset.id, owner_id).await?;
        let ready = self
            .services
            .media_assets
            .mark_ready(asset.id, rendition(), owner_id)
            .await?;
        Ok(ready)
    }

    pub async fn written(
        &self,
        scope: &OwnershipScope,
        title: &str,
        slug: &str,
    ) -> Result<ContentItem> {
        let item = self
            .services
            .content
            .create(NewContentItem::written(title, slug), scope)
            .await?;
        Ok(item)
    }

    pub async fn video(
        &self,
        scope: &OwnershipScope,
        slug: &str,
        asset_id: MediaAssetID,
    ) -> Result<ContentItem> {
        let item = self
            .services
            .content
            .create(
                NewContentItem::with_media(
                    "Lesson",
                    slug,
                    ContentKind::Video,
                    asset_id,
                ),
                scope,
            )
            .await?;
        Ok(item)
    }
}

pub fn rendition() -> ReadyRendition {
    ReadyRendition::new("hls/clip/master.m3u8", "thumbs/clip.jpg", 95)
        .with_dimensions(1920, 1080)
}
