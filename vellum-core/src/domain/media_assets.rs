use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use tracing::{debug, info, warn};
use vellum_model::{
    MediaAsset, MediaAssetID, MediaAssetPatch, MediaAssetQuery,
    MediaAssetStatus, MediaKind, NewMediaAsset, OwnerID, Page, ReadyRendition,
    TranscodingOutcome,
};

use crate::{
    database::ports::media_assets::{
        MediaAssetRepository, MediaAssetTransaction,
    },
    error::{CatalogError, Result},
    query::{MediaAssetListing, PageLimits, prepare},
    validation::{Validate, validate_failure_reason},
};

const DEFAULT_FAILURE_REASON: &str = "transcoding failed";

/// Owns media asset creation, status transitions and soft deletion.
///
/// Every read and write is scoped to the calling owner; an asset owned by
/// someone else is reported exactly like a missing one.
pub struct MediaAssetManager<R>
where
    R: MediaAssetRepository + ?Sized,
{
    repository: Arc<R>,
    limits: PageLimits,
}

impl<R> Clone for MediaAssetManager<R>
where
    R: MediaAssetRepository + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            limits: self.limits,
        }
    }
}

impl<R> fmt::Debug for MediaAssetManager<R>
where
    R: MediaAssetRepository + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAssetManager")
            .field("repository", &type_name_of_val(self.repository.as_ref()))
            .field("limits", &self.limits)
            .finish()
    }
}

impl<R> MediaAssetManager<R>
where
    R: MediaAssetRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    /// Records a freshly uploaded original in `uploading`.
    pub async fn register_upload(
        &self,
        input: NewMediaAsset,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        input.validate()?;

        let now = Utc::now();
        let asset = MediaAsset {
            id: MediaAssetID::new(),
            owner_id,
            kind: input.kind,
            status: MediaAssetStatus::Uploading,
            title: input.title,
            description: input.description,
            storage_key: input.storage_key,
            file_size: input.file_size,
            mime_type: input.mime_type,
            playlist_key: None,
            thumbnail_key: None,
            duration_seconds: None,
            width: None,
            height: None,
            preview_playlist_key: None,
            waveform_key: None,
            waveform_image_key: None,
            mezzanine_key: None,
            ready_variants: Vec::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
            ready_at: None,
            deleted_at: None,
        };

        let mut tx = self.repository.begin().await?;
        let stored = tx.insert_asset(&asset).await?;
        tx.commit().await?;

        info!(
            media_asset_id = %stored.id,
            owner_id = %owner_id,
            kind = %stored.kind,
            "Registered media upload"
        );
        Ok(stored)
    }

    pub async fn get(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        self.repository
            .find_asset(id, owner_id)
            .await?
            .ok_or_else(|| CatalogError::media_asset_not_found(id))
    }

    /// Edits title/description. Status and rendition fields are untouched.
    pub async fn update_metadata(
        &self,
        id: MediaAssetID,
        patch: MediaAssetPatch,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        patch.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut asset = lock(tx.as_mut(), id, owner_id).await?;

        if let Some(title) = patch.title {
            asset.title = title;
        }
        if let Some(description) = patch.description {
            asset.description = description;
        }
        asset.updated_at = Utc::now();

        let stored = tx.update_asset(&asset).await?;
        tx.commit().await?;

        debug!(media_asset_id = %id, "Updated media asset metadata");
        Ok(stored)
    }

    /// Moves the asset one step along the pipeline.
    ///
    /// `ready` is refused here even from `transcoding`: entering it requires
    /// the rendition fields, which only [`Self::mark_ready`] sets.
    pub async fn transition_status(
        &self,
        id: MediaAssetID,
        next: MediaAssetStatus,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        let mut tx = self.repository.begin().await?;
        let mut asset = lock(tx.as_mut(), id, owner_id).await?;

        ensure_transition(&asset, next)?;
        if next == MediaAssetStatus::Ready {
            return Err(CatalogError::validation(
                "status",
                "use mark_ready to supply the rendition when entering ready",
            ));
        }

        let from = asset.status;
        asset.status = next;
        asset.updated_at = Utc::now();

        let stored = tx.update_asset(&asset).await?;
        tx.commit().await?;

        info!(
            media_asset_id = %id,
            from = %from,
            to = %next,
            "Media asset status changed"
        );
        Ok(stored)
    }

    /// `transcoding -> ready` together with the rendition, in one write.
    pub async fn mark_ready(
        &self,
        id: MediaAssetID,
        rendition: ReadyRendition,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        rendition.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut asset = lock(tx.as_mut(), id, owner_id).await?;
        ensure_transition(&asset, MediaAssetStatus::Ready)?;

        let now = Utc::now();
        asset.status = MediaAssetStatus::Ready;
        asset.playlist_key = Some(rendition.playlist_key);
        asset.thumbnail_key = Some(rendition.thumbnail_key);
        asset.duration_seconds = Some(rendition.duration_seconds);
        asset.width = rendition.width;
        asset.height = rendition.height;
        asset.preview_playlist_key = rendition.preview_playlist_key;
        asset.waveform_key = rendition.waveform_key;
        asset.waveform_image_key = rendition.waveform_image_key;
        asset.mezzanine_key = rendition.mezzanine_key;
        asset.ready_variants = rendition.ready_variants;
        asset.failure_reason = None;
        asset.ready_at = Some(now);
        asset.updated_at = now;

        let stored = tx.update_asset(&asset).await?;
        tx.commit().await?;

        info!(
            media_asset_id = %id,
            from = %MediaAssetStatus::Transcoding,
            to = %MediaAssetStatus::Ready,
            duration_seconds = stored.duration_seconds,
            "Media asset ready"
        );
        Ok(stored)
    }

    /// `transcoding -> failed`, recording why.
    pub async fn mark_failed(
        &self,
        id: MediaAssetID,
        reason: impl Into<String>,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        let reason = reason.into();
        validate_failure_reason(&reason)?;

        let mut tx = self.repository.begin().await?;
        let mut asset = lock(tx.as_mut(), id, owner_id).await?;
        ensure_transition(&asset, MediaAssetStatus::Failed)?;

        asset.status = MediaAssetStatus::Failed;
        asset.failure_reason = Some(reason.trim().to_string());
        asset.updated_at = Utc::now();

        let stored = tx.update_asset(&asset).await?;
        tx.commit().await?;

        warn!(
            media_asset_id = %id,
            reason = stored.failure_reason.as_deref().unwrap_or_default(),
            "Media asset failed transcoding"
        );
        Ok(stored)
    }

    /// Routes a worker completion report to `mark_ready` or `mark_failed`.
    ///
    /// Audio renditions often carry only a waveform image; it is used as the
    /// thumbnail when no thumbnail was produced.
    pub async fn apply_transcoding_outcome(
        &self,
        id: MediaAssetID,
        outcome: TranscodingOutcome,
        owner_id: OwnerID,
    ) -> Result<MediaAsset> {
        match outcome {
            TranscodingOutcome::Completed {
                playlist_key,
                preview_playlist_key,
                thumbnail_key,
                waveform_key,
                waveform_image_key,
                mezzanine_key,
                duration_seconds,
                width,
                height,
                ready_variants,
            } => {
                let asset = self.get(id, owner_id).await?;
                let thumbnail_key = match (thumbnail_key, asset.kind) {
                    (Some(key), _) => Some(key),
                    (None, MediaKind::Audio) => waveform_image_key.clone(),
                    (None, MediaKind::Video) => None,
                };

                let rendition = ReadyRendition {
                    playlist_key: playlist_key.unwrap_or_default(),
                    thumbnail_key: thumbnail_key.unwrap_or_default(),
                    duration_seconds: duration_seconds.unwrap_or_default(),
                    width,
                    height,
                    preview_playlist_key,
                    waveform_key,
                    waveform_image_key,
                    mezzanine_key,
                    ready_variants,
                };
                self.mark_ready(id, rendition, owner_id).await
            }
            TranscodingOutcome::Failed { error } => {
                let reason = error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
                self.mark_failed(id, reason, owner_id).await
            }
        }
    }

    /// Sets `deleted_at`. Content items referencing the asset are left alone
    /// and simply stop being publishable.
    pub async fn soft_delete(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<()> {
        let mut tx = self.repository.begin().await?;
        let mut asset = lock(tx.as_mut(), id, owner_id).await?;

        let now = Utc::now();
        asset.deleted_at = Some(now);
        asset.updated_at = now;

        tx.update_asset(&asset).await?;
        tx.commit().await?;

        info!(media_asset_id = %id, owner_id = %owner_id, "Soft-deleted media asset");
        Ok(())
    }

    pub async fn list(
        &self,
        owner_id: OwnerID,
        query: &MediaAssetQuery,
    ) -> Result<Page<MediaAsset>> {
        let page = prepare::<MediaAssetListing>(query, &self.limits)?;
        let mut query = query.clone();
        query.page = page;
        self.repository.list_assets(owner_id, &query).await
    }
}

async fn lock(
    tx: &mut dyn MediaAssetTransaction,
    id: MediaAssetID,
    owner_id: OwnerID,
) -> Result<MediaAsset> {
    tx.lock_asset(id, owner_id)
        .await?
        .ok_or_else(|| CatalogError::media_asset_not_found(id))
}

fn ensure_transition(asset: &MediaAsset, next: MediaAssetStatus) -> Result<()> {
    if asset.status.can_transition_to(next) {
        return Ok(());
    }
    debug!(
        media_asset_id = %asset.id,
        from = %asset.status,
        to = %next,
        "Rejected media asset transition"
    );
    Err(CatalogError::InvalidStateTransition {
        from: asset.status,
        to: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryCatalog;
    use crate::error::CatalogErrorKind;

    fn manager() -> MediaAssetManager<MemoryCatalog> {
        MediaAssetManager::new(Arc::new(MemoryCatalog::new()))
    }

    fn upload(kind: MediaKind) -> NewMediaAsset {
        let mime = match kind {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mpeg",
        };
        NewMediaAsset {
            kind,
            storage_key: "originals/upload.bin".into(),
            file_size: 10_485_760,
            mime_type: mime.into(),
            title: Some("Session one".into()),
            description: None,
        }
    }

    async fn transcoding(
        manager: &MediaAssetManager<MemoryCatalog>,
        kind: MediaKind,
        owner: OwnerID,
    ) -> MediaAsset {
        let asset = manager
            .register_upload(upload(kind), owner)
            .await
            .expect("register");
        manager
            .transition_status(asset.id, MediaAssetStatus::Uploaded, owner)
            .await
            .expect("uploaded");
        manager
            .transition_status(asset.id, MediaAssetStatus::Transcoding, owner)
            .await
            .expect("transcoding")
    }

    #[tokio::test]
    async fn new_uploads_start_in_uploading() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = manager
            .register_upload(upload(MediaKind::Video), owner)
            .await
            .expect("register");
        assert_eq!(asset.status, MediaAssetStatus::Uploading);
        assert_eq!(manager.get(asset.id, owner).await.expect("get"), asset);
    }

    #[tokio::test]
    async fn illegal_transition_leaves_row_unchanged() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = manager
            .register_upload(upload(MediaKind::Video), owner)
            .await
            .expect("register");

        let err = manager
            .transition_status(asset.id, MediaAssetStatus::Transcoding, owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::InvalidStateTransition);

        let err = manager
            .transition_status(asset.id, MediaAssetStatus::Uploading, owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::InvalidStateTransition);

        let reloaded = manager.get(asset.id, owner).await.expect("get");
        assert_eq!(reloaded.status, MediaAssetStatus::Uploading);
        assert_eq!(reloaded.updated_at, asset.updated_at);
    }

    #[tokio::test]
    async fn ready_is_only_reachable_through_mark_ready() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = transcoding(&manager, MediaKind::Video, owner).await;

        let err = manager
            .transition_status(asset.id, MediaAssetStatus::Ready, owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::Validation);

        let ready = manager
            .mark_ready(
                asset.id,
                ReadyRendition::new("hls/master.m3u8", "thumbs/0.jpg", 95)
                    .with_dimensions(1920, 1080),
                owner,
            )
            .await
            .expect("ready");
        assert!(ready.is_ready());
        assert!(ready.rendition_consistent());
        assert_eq!(ready.width, Some(1920));
        assert!(ready.ready_at.is_some());
    }

    #[tokio::test]
    async fn mark_ready_requires_transcoding_and_complete_rendition() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = manager
            .register_upload(upload(MediaKind::Video), owner)
            .await
            .expect("register");

        let err = manager
            .mark_ready(asset.id, ReadyRendition::new("p.m3u8", "t.jpg", 10), owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::InvalidStateTransition);

        let err = manager
            .mark_ready(asset.id, ReadyRendition::new("", "t.jpg", 10), owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::Validation);
    }

    #[tokio::test]
    async fn failed_outcome_records_reason() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = transcoding(&manager, MediaKind::Video, owner).await;

        let failed = manager
            .apply_transcoding_outcome(
                asset.id,
                TranscodingOutcome::Failed { error: None },
                owner,
            )
            .await
            .expect("failed");
        assert_eq!(failed.status, MediaAssetStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some(DEFAULT_FAILURE_REASON));

        let err = manager
            .transition_status(asset.id, MediaAssetStatus::Transcoding, owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn audio_outcome_uses_waveform_as_thumbnail() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = transcoding(&manager, MediaKind::Audio, owner).await;

        let ready = manager
            .apply_transcoding_outcome(
                asset.id,
                TranscodingOutcome::Completed {
                    playlist_key: Some("hls/audio.m3u8".into()),
                    preview_playlist_key: None,
                    thumbnail_key: None,
                    waveform_key: Some("wave/peaks.json".into()),
                    waveform_image_key: Some("wave/peaks.png".into()),
                    mezzanine_key: None,
                    duration_seconds: Some(240),
                    width: None,
                    height: None,
                    ready_variants: vec!["128k".into()],
                },
                owner,
            )
            .await
            .expect("ready");
        assert_eq!(ready.thumbnail_key.as_deref(), Some("wave/peaks.png"));
        assert_eq!(ready.ready_variants, vec!["128k".to_string()]);
    }

    #[tokio::test]
    async fn video_outcome_without_thumbnail_is_rejected() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = transcoding(&manager, MediaKind::Video, owner).await;

        let err = manager
            .apply_transcoding_outcome(
                asset.id,
                TranscodingOutcome::Completed {
                    playlist_key: Some("hls/master.m3u8".into()),
                    preview_playlist_key: None,
                    thumbnail_key: None,
                    waveform_key: None,
                    waveform_image_key: Some("ignored.png".into()),
                    mezzanine_key: None,
                    duration_seconds: Some(30),
                    width: None,
                    height: None,
                    ready_variants: Vec::new(),
                },
                owner,
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, CatalogError::Validation(e) if e.has_field("thumbnail_key")));

        let reloaded = manager.get(asset.id, owner).await.expect("get");
        assert_eq!(reloaded.status, MediaAssetStatus::Transcoding);
    }

    #[tokio::test]
    async fn foreign_and_deleted_assets_are_not_found() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = manager
            .register_upload(upload(MediaKind::Video), owner)
            .await
            .expect("register");

        let err = manager.get(asset.id, OwnerID::new()).await.unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::NotFound);

        let err = manager
            .soft_delete(asset.id, OwnerID::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::NotFound);

        manager.soft_delete(asset.id, owner).await.expect("delete");
        let err = manager.get(asset.id, owner).await.unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::NotFound);
    }

    #[tokio::test]
    async fn metadata_patch_must_change_something() {
        let manager = manager();
        let owner = OwnerID::new();
        let asset = manager
            .register_upload(upload(MediaKind::Audio), owner)
            .await
            .expect("register");

        let err = manager
            .update_metadata(asset.id, MediaAssetPatch::default(), owner)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CatalogErrorKind::Validation);

        let updated = manager
            .update_metadata(
                asset.id,
                MediaAssetPatch {
                    title: Some(Some("Episode 4".into())),
                    description: Some(Some("Pilot".into())),
                },
                owner,
            )
            .await
            .expect("update");
        assert_eq!(updated.title.as_deref(), Some("Episode 4"));
        assert_eq!(updated.status, MediaAssetStatus::Uploading);

        let cleared = manager
            .update_metadata(
                asset.id,
                MediaAssetPatch {
                    title: None,
                    description: Some(None),
                },
                owner,
            )
            .await
            .expect("clear description");
        assert_eq!(cleared.title.as_deref(), Some("Episode 4"));
        assert!(cleared.description.is_none());
    }
}
