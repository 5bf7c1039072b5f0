use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;
use vellum_model::{
    MediaAsset, MediaAssetFilters, MediaAssetID, MediaAssetQuery,
    MediaAssetSortKey, OwnerID, Page,
};

use crate::{
    database::ports::media_assets::{
        MediaAssetRepository, MediaAssetTransaction,
    },
    error::{CatalogError, Result},
    query::{
        MediaAssetListing, ScopePredicate,
        postgres::{PgListable, fetch_page},
    },
};

macro_rules! asset_columns {
    () => {
        "id, owner_id, kind, status, title, description, storage_key, \
         file_size, mime_type, playlist_key, thumbnail_key, duration_seconds, \
         width, height, preview_playlist_key, waveform_key, \
         waveform_image_key, mezzanine_key, ready_variants, failure_reason, \
         created_at, updated_at, ready_at, deleted_at"
    };
}

/// Row-level lock taken by a scoped asset read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowLock {
    None,
    Share,
    Update,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MediaAssetRow {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    status: String,
    title: Option<String>,
    description: Option<String>,
    storage_key: String,
    file_size: i64,
    mime_type: String,
    playlist_key: Option<String>,
    thumbnail_key: Option<String>,
    duration_seconds: Option<i32>,
    width: Option<i32>,
    height: Option<i32>,
    preview_playlist_key: Option<String>,
    waveform_key: Option<String>,
    waveform_image_key: Option<String>,
    mezzanine_key: Option<String>,
    ready_variants: Vec<String>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ready_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<MediaAssetRow> for MediaAsset {
    type Error = CatalogError;

    fn try_from(row: MediaAssetRow) -> Result<Self> {
        Ok(MediaAsset {
            id: MediaAssetID(row.id),
            owner_id: OwnerID(row.owner_id),
            kind: row.kind.parse()?,
            status: row.status.parse()?,
            title: row.title,
            description: row.description,
            storage_key: row.storage_key,
            file_size: row.file_size,
            mime_type: row.mime_type,
            playlist_key: row.playlist_key,
            thumbnail_key: row.thumbnail_key,
            duration_seconds: row.duration_seconds,
            width: row.width,
            height: row.height,
            preview_playlist_key: row.preview_playlist_key,
            waveform_key: row.waveform_key,
            waveform_image_key: row.waveform_image_key,
            mezzanine_key: row.mezzanine_key,
            ready_variants: row.ready_variants,
            failure_reason: row.failure_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ready_at: row.ready_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// Scoped read of one live asset. Foreign and soft-deleted rows read as
/// `None`.
pub(crate) async fn select_asset(
    conn: &mut PgConnection,
    id: MediaAssetID,
    owner_id: OwnerID,
    lock: RowLock,
) -> Result<Option<MediaAsset>> {
    let sql = match lock {
        RowLock::None => concat!(
            "SELECT ",
            asset_columns!(),
            " FROM media_assets WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL"
        ),
        RowLock::Share => concat!(
            "SELECT ",
            asset_columns!(),
            " FROM media_assets WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL FOR SHARE"
        ),
        RowLock::Update => concat!(
            "SELECT ",
            asset_columns!(),
            " FROM media_assets WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL FOR UPDATE"
        ),
    };

    let row = sqlx::query_as::<_, MediaAssetRow>(sql)
        .bind(id.to_uuid())
        .bind(owner_id.to_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!("Failed to load media asset: {}", e))
        })?;

    row.map(MediaAsset::try_from).transpose()
}

fn map_write_error(e: sqlx::Error, action: &str) -> CatalogError {
    if let Some(db_err) = e.as_database_error()
        && db_err.constraint() == Some("media_assets_ready_requires_rendition")
    {
        return CatalogError::validation(
            "status",
            "a ready asset needs a playlist, a thumbnail and a duration",
        );
    }
    CatalogError::Internal(format!("Failed to {} media asset: {}", action, e))
}

/// PostgreSQL-backed implementation of the `MediaAssetRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresMediaAssetRepository {
    pool: PgPool,
}

impl PostgresMediaAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MediaAssetRepository for PostgresMediaAssetRepository {
    async fn begin(&self) -> Result<Box<dyn MediaAssetTransaction>> {
        let tx = self.pool().begin().await.map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to start transaction: {}",
                e
            ))
        })?;
        Ok(Box::new(PostgresMediaAssetTransaction { tx }))
    }

    async fn find_asset(
        &self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        let mut conn = self.pool().acquire().await.map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to acquire connection: {}",
                e
            ))
        })?;
        select_asset(&mut conn, id, owner_id, RowLock::None).await
    }

    async fn list_assets(
        &self,
        owner_id: OwnerID,
        query: &MediaAssetQuery,
    ) -> Result<Page<MediaAsset>> {
        fetch_page::<MediaAssetListing>(
            self.pool(),
            &ScopePredicate::owner(owner_id),
            query,
            query.page,
        )
        .await
    }
}

pub struct PostgresMediaAssetTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresMediaAssetTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresMediaAssetTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl MediaAssetTransaction for PostgresMediaAssetTransaction {
    async fn lock_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        select_asset(&mut self.tx, id, owner_id, RowLock::Update).await
    }

    async fn insert_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset> {
        let row = sqlx::query_as::<_, MediaAssetRow>(concat!(
            r#"
            INSERT INTO media_assets (
                id, owner_id, kind, status, title, description, storage_key,
                file_size, mime_type, playlist_key, thumbnail_key,
                duration_seconds, width, height, preview_playlist_key,
                waveform_key, waveform_image_key, mezzanine_key,
                ready_variants, failure_reason, created_at, updated_at,
                ready_at, deleted_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            RETURNING "#,
            asset_columns!()
        ))
        .bind(asset.id.to_uuid())
        .bind(asset.owner_id.to_uuid())
        .bind(asset.kind.as_str())
        .bind(asset.status.as_str())
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(&asset.storage_key)
        .bind(asset.file_size)
        .bind(&asset.mime_type)
        .bind(&asset.playlist_key)
        .bind(&asset.thumbnail_key)
        .bind(asset.duration_seconds)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.preview_playlist_key)
        .bind(&asset.waveform_key)
        .bind(&asset.waveform_image_key)
        .bind(&asset.mezzanine_key)
        .bind(&asset.ready_variants)
        .bind(&asset.failure_reason)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .bind(asset.ready_at)
        .bind(asset.deleted_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "create"))?;

        MediaAsset::try_from(row)
    }

    async fn update_asset(&mut self, asset: &MediaAsset) -> Result<MediaAsset> {
        let row = sqlx::query_as::<_, MediaAssetRow>(concat!(
            r#"
            UPDATE media_assets
            SET status = $3,
                title = $4,
                description = $5,
                playlist_key = $6,
                thumbnail_key = $7,
                duration_seconds = $8,
                width = $9,
                height = $10,
                preview_playlist_key = $11,
                waveform_key = $12,
                waveform_image_key = $13,
                mezzanine_key = $14,
                ready_variants = $15,
                failure_reason = $16,
                updated_at = $17,
                ready_at = $18,
                deleted_at = $19
            WHERE id = $1 AND owner_id = $2
            RETURNING "#,
            asset_columns!()
        ))
        .bind(asset.id.to_uuid())
        .bind(asset.owner_id.to_uuid())
        .bind(asset.status.as_str())
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(&asset.playlist_key)
        .bind(&asset.thumbnail_key)
        .bind(asset.duration_seconds)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.preview_playlist_key)
        .bind(&asset.waveform_key)
        .bind(&asset.waveform_image_key)
        .bind(&asset.mezzanine_key)
        .bind(&asset.ready_variants)
        .bind(&asset.failure_reason)
        .bind(asset.updated_at)
        .bind(asset.ready_at)
        .bind(asset.deleted_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, "update"))?
        .ok_or_else(|| CatalogError::media_asset_not_found(asset.id))?;

        MediaAsset::try_from(row)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to commit transaction: {}",
                e
            ))
        })
    }
}

impl PgListable for MediaAssetListing {
    const TABLE: &'static str = "media_assets";
    const COLUMNS: &'static str = asset_columns!();
    const SEARCH_COLUMN: &'static str = "title";

    type Row = MediaAssetRow;

    fn push_filters(
        builder: &mut QueryBuilder<'static, Postgres>,
        filters: &MediaAssetFilters,
    ) {
        if let Some(kind) = filters.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(status) = filters.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
    }

    fn sort_expression(key: MediaAssetSortKey) -> &'static str {
        match key {
            MediaAssetSortKey::CreatedAt => "created_at",
            MediaAssetSortKey::ReadyAt => "ready_at",
            MediaAssetSortKey::FileSize => "file_size",
            MediaAssetSortKey::Title => "title COLLATE \"C\"",
        }
    }

    fn decode(row: MediaAssetRow) -> Result<MediaAsset> {
        MediaAsset::try_from(row)
    }
}
