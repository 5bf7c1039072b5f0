//! Catalog behaviour against a real Postgres schema.
//!
//! Needs `DATABASE_URL`; run with `--features postgres-tests`.
#![cfg(feature = "postgres-tests")]

use anyhow::Result;
use sqlx::PgPool;
use vellum_core::PostgresCatalog;
use vellum_core::model::{
    ContentItemFilters, ContentItemQuery, ContentItemSortKey, MediaAssetFilters,
    MediaAssetQuery, MediaAssetSortKey, MediaAssetStatus, MediaKind,
    NewContentItem, OrganizationID, OwnerID, OwnershipScope, PublicationStatus,
    ReadyRendition, SortDirection,
};
use vellum_core::CatalogError;

#[path = "support/mod.rs"]
mod support;

use support::{CatalogHarness, rendition};

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn media_readiness_gates_publish(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let owner = OwnerID::new();
    let scope = OwnershipScope::personal(owner);
    let content = &harness.services.content;

    let asset = harness.upload(owner, MediaKind::Video).await?;
    let item = harness.video(&scope, "lesson-1", asset.id).await?;

    assert!(matches!(
        content.publish(item.id, owner).await,
        Err(CatalogError::MediaNotReady {
            status: Some(MediaAssetStatus::Uploading),
            ..
        })
    ));

    harness.start_transcoding(asset.id, owner).await?;
    let ready = harness
        .services
        .media_assets
        .mark_ready(asset.id, rendition(), owner)
        .await?;
    assert_eq!(ready.width, Some(1920));
    assert!(ready.ready_at.is_some());

    let published = content.publish(item.id, owner).await?;
    assert_eq!(published.publication_status, PublicationStatus::Published);
    let again = content.publish(item.id, owner).await?;
    assert_eq!(again.published_at, published.published_at);

    let details = content.get(item.id, owner).await?;
    assert_eq!(details.media_asset.map(|a| a.id), Some(asset.id));
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn zero_length_rendition_is_accepted_by_the_schema(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let owner = OwnerID::new();

    let asset = harness.upload(owner, MediaKind::Audio).await?;
    harness.start_transcoding(asset.id, owner).await?;
    let ready = harness
        .services
        .media_assets
        .mark_ready(
            asset.id,
            ReadyRendition::new("hls/sting/master.m3u8", "waveforms/sting.png", 0),
            owner,
        )
        .await?;
    assert_eq!(ready.status, MediaAssetStatus::Ready);
    assert_eq!(ready.duration_seconds, Some(0));
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn slug_index_follows_scope_and_soft_delete(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let owner = OwnerID::new();
    let personal = OwnershipScope::personal(owner);
    let org = OwnershipScope::organization(owner, OrganizationID::new());
    let content = &harness.services.content;

    let first = harness.written(&personal, "Intro", "intro").await?;
    let clash = content
        .create(NewContentItem::written("Intro", "intro"), &personal)
        .await;
    assert!(matches!(clash, Err(CatalogError::SlugConflict { .. })));

    harness.written(&org, "Intro", "intro").await?;

    content.soft_delete(first.id, owner).await?;
    harness.written(&personal, "Intro v2", "intro").await?;
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn concurrent_creates_leave_one_row(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let scope = OwnershipScope::personal(OwnerID::new());

    let attempts = (0..6).map(|n| {
        let content = harness.services.content.clone();
        async move {
            content
                .create(
                    NewContentItem::written(format!("Take {n}"), "launch"),
                    &scope,
                )
                .await
        }
    });
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, CatalogError::SlugConflict { .. }))
    );
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn listing_matches_scope_filters_and_order(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let owner = OwnerID::new();
    let scope = OwnershipScope::personal(owner);
    let content = &harness.services.content;

    for (title, slug, tag) in [
        ("Beta 100%", "beta", "rust"),
        ("alpha", "alpha", "rust"),
        ("Gamma", "gamma", "go"),
    ] {
        let mut input = NewContentItem::written(title, slug);
        input.tags = vec![tag.to_string()];
        content.create(input, &scope).await?;
    }
    harness
        .written(&OwnershipScope::personal(OwnerID::new()), "Beta 100%", "beta")
        .await?;

    let rust = content
        .list(
            &scope,
            &ContentItemQuery::new()
                .with_filters(ContentItemFilters {
                    tag: Some("rust".into()),
                    ..ContentItemFilters::default()
                })
                .sorted_by(ContentItemSortKey::Title, SortDirection::Ascending),
        )
        .await?;
    assert_eq!(rust.total, 2);
    let titles: Vec<_> = rust.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["Beta 100%", "alpha"]);

    let literal = content
        .list(
            &scope,
            &ContentItemQuery::new().with_filters(ContentItemFilters {
                search: Some("100%".into()),
                ..ContentItemFilters::default()
            }),
        )
        .await?;
    assert_eq!(literal.total, 1);

    let wildcard_only = content
        .list(
            &scope,
            &ContentItemQuery::new().with_filters(ContentItemFilters {
                search: Some("%".into()),
                ..ContentItemFilters::default()
            }),
        )
        .await?;
    assert_eq!(wildcard_only.total, 1);

    let past_end = content
        .list(&scope, &ContentItemQuery::new().page(3, 2))
        .await?;
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 3);
    assert_eq!(past_end.total_pages, 2);
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn asset_listing_sorts_nulls_last(pool: PgPool) -> Result<()> {
    let harness = CatalogHarness::postgres(pool);
    let owner = OwnerID::new();
    let assets = &harness.services.media_assets;

    let pending = harness.upload(owner, MediaKind::Video).await?;
    let ready = harness.ready_asset(owner, MediaKind::Video).await?;
    harness.upload(owner, MediaKind::Audio).await?;

    let by_ready = assets
        .list(
            owner,
            &MediaAssetQuery::new()
                .with_filters(MediaAssetFilters {
                    kind: Some(MediaKind::Video),
                    ..MediaAssetFilters::default()
                })
                .sorted_by(MediaAssetSortKey::ReadyAt, SortDirection::Descending),
        )
        .await?;
    let ids: Vec<_> = by_ready.items.iter().map(|a| a.id).collect();
    assert_eq!(ids, [ready.id, pending.id]);

    assets.soft_delete(ready.id, owner).await?;
    let remaining = assets.list(owner, &MediaAssetQuery::new()).await?;
    assert_eq!(remaining.total, 2);
    Ok(())
}

#[sqlx::test(migrator = "vellum_core::MIGRATOR")]
async fn pool_reports_health(pool: PgPool) -> Result<()> {
    let catalog = PostgresCatalog::from_pool(pool);
    catalog.ping().await?;
    let stats = catalog.pool_stats();
    assert!(stats.size >= stats.idle);
    Ok(())
}
