use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;
use vellum_model::{
    ContentItem, ContentItemFilters, ContentItemID, ContentItemQuery,
    ContentItemSortKey, MediaAsset, MediaAssetID, OrganizationID, OwnerID,
    OwnershipScope, Page,
};

use super::media_assets::{RowLock, select_asset};
use crate::{
    database::ports::{
        content_items::{ContentItemRepository, ContentItemTransaction},
        media_assets::AssetLookup,
    },
    error::{CatalogError, Result},
    query::{
        ContentItemListing, ScopePredicate,
        postgres::{PgListable, fetch_page},
    },
};

macro_rules! item_columns {
    () => {
        "id, owner_id, organization_id, media_asset_id, title, slug, kind, \
         visibility, price_cents, category, tags, body, publication_status, \
         published_at, view_count, purchase_count, created_at, updated_at, \
         deleted_at"
    };
}

#[derive(Debug, sqlx::FromRow)]
pub struct ContentItemRow {
    id: Uuid,
    owner_id: Uuid,
    organization_id: Option<Uuid>,
    media_asset_id: Option<Uuid>,
    title: String,
    slug: String,
    kind: String,
    visibility: String,
    price_cents: Option<i64>,
    category: Option<String>,
    tags: Vec<String>,
    body: Option<String>,
    publication_status: String,
    published_at: Option<DateTime<Utc>>,
    view_count: i64,
    purchase_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContentItemRow> for ContentItem {
    type Error = CatalogError;

    fn try_from(row: ContentItemRow) -> Result<Self> {
        Ok(ContentItem {
            id: ContentItemID(row.id),
            owner_id: OwnerID(row.owner_id),
            organization_id: row.organization_id.map(OrganizationID),
            media_asset_id: row.media_asset_id.map(MediaAssetID),
            title: row.title,
            slug: row.slug,
            kind: row.kind.parse()?,
            visibility: row.visibility.parse()?,
            price_cents: row.price_cents,
            category: row.category,
            tags: row.tags,
            body: row.body,
            publication_status: row.publication_status.parse()?,
            published_at: row.published_at,
            view_count: row.view_count,
            purchase_count: row.purchase_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

async fn select_item(
    conn: &mut PgConnection,
    id: ContentItemID,
    owner_id: OwnerID,
    lock: RowLock,
) -> Result<Option<ContentItem>> {
    let sql = match lock {
        RowLock::None => concat!(
            "SELECT ",
            item_columns!(),
            " FROM content_items WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL"
        ),
        RowLock::Share => concat!(
            "SELECT ",
            item_columns!(),
            " FROM content_items WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL FOR SHARE"
        ),
        RowLock::Update => concat!(
            "SELECT ",
            item_columns!(),
            " FROM content_items WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL FOR UPDATE"
        ),
    };

    let row = sqlx::query_as::<_, ContentItemRow>(sql)
        .bind(id.to_uuid())
        .bind(owner_id.to_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!("Failed to load content item: {}", e))
        })?;

    row.map(ContentItem::try_from).transpose()
}

fn map_write_error(e: sqlx::Error, item: &ContentItem, action: &str) -> CatalogError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.constraint() {
            Some("content_items_scope_slug_key") => {
                return CatalogError::SlugConflict {
                    slug: item.slug.clone(),
                };
            }
            Some("content_items_media_asset_id_fkey") => {
                if let Some(asset_id) = item.media_asset_id {
                    return CatalogError::media_asset_not_found(asset_id);
                }
            }
            Some("content_items_written_has_no_media")
            | Some("content_items_media_kind_has_media") => {
                return CatalogError::validation(
                    "media_asset_id",
                    "media reference does not match the content kind",
                );
            }
            _ => {}
        }
    }
    CatalogError::Internal(format!("Failed to {} content item: {}", action, e))
}

/// PostgreSQL-backed implementation of the `ContentItemRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresContentItemRepository {
    pool: PgPool,
}

impl PostgresContentItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentItemRepository for PostgresContentItemRepository {
    async fn begin(&self) -> Result<Box<dyn ContentItemTransaction>> {
        let tx = self.pool().begin().await.map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to start transaction: {}",
                e
            ))
        })?;
        Ok(Box::new(PostgresContentItemTransaction { tx }))
    }

    async fn list_items(
        &self,
        scope: &OwnershipScope,
        query: &ContentItemQuery,
    ) -> Result<Page<ContentItem>> {
        fetch_page::<ContentItemListing>(
            self.pool(),
            &ScopePredicate::scoped(scope),
            query,
            query.page,
        )
        .await
    }
}

pub struct PostgresContentItemTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PostgresContentItemTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresContentItemTransaction")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AssetLookup for PostgresContentItemTransaction {
    async fn lookup_asset(
        &mut self,
        id: MediaAssetID,
        owner_id: OwnerID,
    ) -> Result<Option<MediaAsset>> {
        // Shared lock: the asset cannot leave `ready` or be deleted until
        // this transaction ends.
        select_asset(&mut self.tx, id, owner_id, RowLock::Share).await
    }
}

#[async_trait]
impl ContentItemTransaction for PostgresContentItemTransaction {
    async fn find_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>> {
        select_item(&mut self.tx, id, owner_id, RowLock::None).await
    }

    async fn lock_item(
        &mut self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<Option<ContentItem>> {
        select_item(&mut self.tx, id, owner_id, RowLock::Update).await
    }

    async fn slug_in_use(
        &mut self,
        scope: &OwnershipScope,
        slug: &str,
        excluding: Option<ContentItemID>,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM content_items
                WHERE owner_id = $1
                  AND organization_id IS NOT DISTINCT FROM $2
                  AND slug = $3
                  AND deleted_at IS NULL
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(scope.owner_id.to_uuid())
        .bind(scope.organization_id.map(|org| org.to_uuid()))
        .bind(slug)
        .bind(excluding.map(|id| id.to_uuid()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!("Failed to check slug: {}", e))
        })
    }

    async fn insert_item(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let row = sqlx::query_as::<_, ContentItemRow>(concat!(
            r#"
            INSERT INTO content_items (
                id, owner_id, organization_id, media_asset_id, title, slug,
                kind, visibility, price_cents, category, tags, body,
                publication_status, published_at, view_count, purchase_count,
                created_at, updated_at, deleted_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19
            )
            RETURNING "#,
            item_columns!()
        ))
        .bind(item.id.to_uuid())
        .bind(item.owner_id.to_uuid())
        .bind(item.organization_id.map(|org| org.to_uuid()))
        .bind(item.media_asset_id.map(|id| id.to_uuid()))
        .bind(&item.title)
        .bind(&item.slug)
        .bind(item.kind.as_str())
        .bind(item.visibility.as_str())
        .bind(item.price_cents)
        .bind(&item.category)
        .bind(&item.tags)
        .bind(&item.body)
        .bind(item.publication_status.as_str())
        .bind(item.published_at)
        .bind(item.view_count)
        .bind(item.purchase_count)
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(item.deleted_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, item, "create"))?;

        ContentItem::try_from(row)
    }

    async fn update_item(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let row = sqlx::query_as::<_, ContentItemRow>(concat!(
            r#"
            UPDATE content_items
            SET title = $3,
                slug = $4,
                visibility = $5,
                price_cents = $6,
                category = $7,
                tags = $8,
                body = $9,
                publication_status = $10,
                published_at = $11,
                updated_at = $12,
                deleted_at = $13
            WHERE id = $1 AND owner_id = $2
            RETURNING "#,
            item_columns!()
        ))
        .bind(item.id.to_uuid())
        .bind(item.owner_id.to_uuid())
        .bind(&item.title)
        .bind(&item.slug)
        .bind(item.visibility.as_str())
        .bind(item.price_cents)
        .bind(&item.category)
        .bind(&item.tags)
        .bind(&item.body)
        .bind(item.publication_status.as_str())
        .bind(item.published_at)
        .bind(item.updated_at)
        .bind(item.deleted_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_write_error(e, item, "update"))?
        .ok_or_else(|| CatalogError::content_item_not_found(item.id))?;

        ContentItem::try_from(row)
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

impl PgListable for ContentItemListing {
    const TABLE: &'static str = "content_items";
    const COLUMNS: &'static str = item_columns!();
    const SEARCH_COLUMN: &'static str = "title";

    type Row = ContentItemRow;

    fn push_filters(
        builder: &mut QueryBuilder<'static, Postgres>,
        filters: &ContentItemFilters,
    ) {
        if let Some(kind) = filters.kind {
            builder.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(status) = filters.publication_status {
            builder
                .push(" AND publication_status = ")
                .push_bind(status.as_str());
        }
        if let Some(visibility) = filters.visibility {
            builder
                .push(" AND visibility = ")
                .push_bind(visibility.as_str());
        }
        if let Some(category) = filters.category.clone() {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(tag) = filters.tag.clone() {
            builder
                .push(" AND ")
                .push_bind(tag)
                .push(" = ANY(tags)");
        }
        if let Some(asset_id) = filters.media_asset_id {
            builder
                .push(" AND media_asset_id = ")
                .push_bind(asset_id.to_uuid());
        }
    }

    fn sort_expression(key: ContentItemSortKey) -> &'static str {
        match key {
            ContentItemSortKey::CreatedAt => "created_at",
            ContentItemSortKey::UpdatedAt => "updated_at",
            ContentItemSortKey::PublishedAt => "published_at",
            ContentItemSortKey::Title => "title COLLATE \"C\"",
            ContentItemSortKey::Price => "price_cents",
            ContentItemSortKey::ViewCount => "view_count",
            ContentItemSortKey::PurchaseCount => "purchase_count",
        }
    }

    fn decode(row: ContentItemRow) -> Result<ContentItem> {
        ContentItem::try_from(row)
    }
}
