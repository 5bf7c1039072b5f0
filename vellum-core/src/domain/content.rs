use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use tracing::{debug, info};
use vellum_model::{
    ContentItem, ContentItemDetails, ContentItemID, ContentItemPatch,
    ContentItemQuery, NewContentItem, OwnerID, OwnershipScope, Page,
    PublicationStatus, patch::assigned,
};

use crate::{
    database::ports::content_items::{
        ContentItemRepository, ContentItemTransaction,
    },
    error::{CatalogError, Result},
    query::{ContentItemListing, PageLimits, prepare},
    validation::{Validate, validate_body_for_kind},
};

/// Owns content item creation, metadata edits, the publication lifecycle and
/// soft deletion.
///
/// Media assets are only ever read, through the transaction's
/// [`AssetLookup`](crate::database::ports::AssetLookup) capability, so the
/// readiness check and the write it guards share one transaction.
pub struct ContentManager<R>
where
    R: ContentItemRepository + ?Sized,
{
    repository: Arc<R>,
    limits: PageLimits,
}

impl<R> Clone for ContentManager<R>
where
    R: ContentItemRepository + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            limits: self.limits,
        }
    }
}

impl<R> fmt::Debug for ContentManager<R>
where
    R: ContentItemRepository + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentManager")
            .field("repository", &type_name_of_val(self.repository.as_ref()))
            .field("limits", &self.limits)
            .finish()
    }
}

impl<R> ContentManager<R>
where
    R: ContentItemRepository + ?Sized,
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

    /// Creates a draft item in `scope`.
    ///
    /// The slug probe only produces an early, clear error; the store's unique
    /// index decides races and surfaces the loser as `SlugConflict` too.
    pub async fn create(
        &self,
        input: NewContentItem,
        scope: &OwnershipScope,
    ) -> Result<ContentItem> {
        input.validate()?;

        let mut tx = self.repository.begin().await?;

        if let Some(asset_id) = input.media_asset_id {
            let asset = tx
                .lookup_asset(asset_id, scope.owner_id)
                .await?
                .ok_or_else(|| CatalogError::media_asset_not_found(asset_id))?;

            if input.kind.required_media_kind() != Some(asset.kind) {
                return Err(CatalogError::ContentKindMismatch {
                    content_kind: input.kind,
                    media_kind: asset.kind,
                });
            }
        }

        if tx.slug_in_use(scope, &input.slug, None).await? {
            debug!(slug = %input.slug, owner_id = %scope.owner_id, "Slug already taken");
            return Err(CatalogError::SlugConflict { slug: input.slug });
        }

        let now = Utc::now();
        let item = ContentItem {
            id: ContentItemID::new(),
            owner_id: scope.owner_id,
            organization_id: scope.organization_id,
            media_asset_id: input.media_asset_id,
            title: input.title,
            slug: input.slug,
            kind: input.kind,
            visibility: input.visibility,
            price_cents: input.price_cents,
            category: input.category,
            tags: input.tags,
            body: input.body,
            publication_status: PublicationStatus::Draft,
            published_at: None,
            view_count: 0,
            purchase_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let stored = tx.insert_item(&item).await?;
        tx.commit().await?;

        info!(
            content_item_id = %stored.id,
            owner_id = %stored.owner_id,
            kind = %stored.kind,
            slug = %stored.slug,
            "Created content item"
        );
        Ok(stored)
    }

    /// Scoped read with the linked media asset resolved. A soft-deleted asset
    /// resolves to `None`.
    pub async fn get(
        &self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<ContentItemDetails> {
        let mut tx = self.repository.begin().await?;
        let item = tx
            .find_item(id, owner_id)
            .await?
            .ok_or_else(|| CatalogError::content_item_not_found(id))?;

        let media_asset = match item.media_asset_id {
            Some(asset_id) => tx.lookup_asset(asset_id, owner_id).await?,
            None => None,
        };
        tx.commit().await?;

        Ok(ContentItemDetails { item, media_asset })
    }

    /// Metadata edit. The media link is immutable; a slug change is checked
    /// against the item's scope, ignoring the item itself.
    pub async fn update(
        &self,
        id: ContentItemID,
        patch: ContentItemPatch,
        owner_id: OwnerID,
    ) -> Result<ContentItem> {
        patch.validate()?;

        let mut tx = self.repository.begin().await?;
        let mut item = lock(tx.as_mut(), id, owner_id).await?;

        if patch.is_empty() {
            return Ok(item);
        }
        validate_body_for_kind(item.kind, assigned(&patch.body).map(String::as_str))?;

        if let Some(slug) = patch.slug.as_deref()
            && slug != item.slug
            && tx.slug_in_use(&scope_of(&item), slug, Some(item.id)).await?
        {
            debug!(slug = %slug, content_item_id = %id, "Slug already taken");
            return Err(CatalogError::SlugConflict {
                slug: slug.to_string(),
            });
        }

        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(slug) = patch.slug {
            item.slug = slug;
        }
        if let Some(visibility) = patch.visibility {
            item.visibility = visibility;
        }
        if let Some(price_cents) = patch.price_cents {
            item.price_cents = price_cents;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(tags) = patch.tags {
            item.tags = tags;
        }
        if let Some(body) = patch.body {
            item.body = body;
        }
        item.updated_at = Utc::now();

        let stored = tx.update_item(&item).await?;
        tx.commit().await?;

        debug!(content_item_id = %id, "Updated content item");
        Ok(stored)
    }

    /// Publishes the item. Already-published items come back unchanged;
    /// `published_at` is only stamped on the first publish.
    ///
    /// Media-backed items re-read their asset inside this transaction, so a
    /// readiness result can never be stale.
    pub async fn publish(
        &self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<ContentItem> {
        let mut tx = self.repository.begin().await?;
        let mut item = lock(tx.as_mut(), id, owner_id).await?;

        if item.publication_status == PublicationStatus::Published {
            return Ok(item);
        }

        if item.kind.requires_media() {
            let Some(asset_id) = item.media_asset_id else {
                return Err(CatalogError::Unpublishable {
                    content_item_id: id.to_uuid(),
                    reason: format!("{} content has no media asset", item.kind),
                });
            };

            let asset = tx.lookup_asset(asset_id, owner_id).await?;
            match asset {
                Some(asset) if asset.is_ready() => {}
                other => {
                    let status = other.map(|asset| asset.status);
                    debug!(
                        content_item_id = %id,
                        media_asset_id = %asset_id,
                        status = ?status,
                        "Publish refused, media not ready"
                    );
                    return Err(CatalogError::MediaNotReady {
                        media_asset_id: asset_id.to_uuid(),
                        status,
                    });
                }
            }
        }

        let now = Utc::now();
        let from = item.publication_status;
        item.publication_status = PublicationStatus::Published;
        if item.published_at.is_none() {
            item.published_at = Some(now);
        }
        item.updated_at = now;

        let stored = tx.update_item(&item).await?;
        tx.commit().await?;

        info!(
            content_item_id = %id,
            from = %from,
            to = %PublicationStatus::Published,
            "Published content item"
        );
        Ok(stored)
    }

    /// Returns the item to `draft`. `published_at` is kept.
    pub async fn unpublish(
        &self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<ContentItem> {
        self.set_publication_status(id, PublicationStatus::Draft, owner_id)
            .await
    }

    /// Moves the item to `archived`. Repeating the call is a no-op.
    pub async fn archive(
        &self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<ContentItem> {
        self.set_publication_status(id, PublicationStatus::Archived, owner_id)
            .await
    }

    /// Sets `deleted_at`. The linked media asset is not touched and the slug
    /// becomes free for reuse in the same scope.
    pub async fn soft_delete(
        &self,
        id: ContentItemID,
        owner_id: OwnerID,
    ) -> Result<()> {
        let mut tx = self.repository.begin().await?;
        let mut item = lock(tx.as_mut(), id, owner_id).await?;

        let now = Utc::now();
        item.deleted_at = Some(now);
        item.updated_at = now;

        tx.update_item(&item).await?;
        tx.commit().await?;

        info!(content_item_id = %id, owner_id = %owner_id, "Soft-deleted content item");
        Ok(())
    }

    pub async fn list(
        &self,
        scope: &OwnershipScope,
        query: &ContentItemQuery,
    ) -> Result<Page<ContentItem>> {
        let page = prepare::<ContentItemListing>(query, &self.limits)?;
        let mut query = query.clone();
        query.page = page;
        self.repository.list_items(scope, &query).await
    }

    async fn set_publication_status(
        &self,
        id: ContentItemID,
        next: PublicationStatus,
        owner_id: OwnerID,
    ) -> Result<ContentItem> {
        let mut tx = self.repository.begin().await?;
        let mut item = lock(tx.as_mut(), id, owner_id).await?;

        if item.publication_status == next {
            return Ok(item);
        }

        let from = item.publication_status;
        item.publication_status = next;
        item.updated_at = Utc::now();

        let stored = tx.update_item(&item).await?;
        tx.commit().await?;

        info!(
            content_item_id = %id,
            from = %from,
            to = %next,
            "Content item publication status changed"
        );
        Ok(stored)
    }
}

fn scope_of(item: &ContentItem) -> OwnershipScope {
    OwnershipScope {
        owner_id: item.owner_id,
        organization_id: item.organization_id,
    }
}

async fn lock(
    tx: &mut dyn ContentItemTransaction,
    id: ContentItemID,
    owner_id: OwnerID,
) -> Result<ContentItem> {
    tx.lock_item(id, owner_id)
        .await?
        .ok_or_else(|| CatalogError::content_item_not_found(id))
}
