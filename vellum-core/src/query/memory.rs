//! In-process rendition of the listing engine, used by the in-memory store.
//!
//! Mirrors the SQL builder: scope first, then filters, then a total count,
//! then the ordered slice. Nulls sort last and ties fall back to the id.

use std::cmp::Ordering;

use uuid::Uuid;
use vellum_model::{
    ContentItem, ContentItemFilters, ContentItemSortKey, ListQuery, MediaAsset,
    MediaAssetFilters, MediaAssetSortKey, OrganizationID, OwnerID, Page,
    PageRequest, SortDirection,
};

use super::{
    ContentItemListing, ListableEntity, MediaAssetListing, ScopePredicate,
    compare_nulls_last, directed, non_blank, tie_break,
};

pub trait MemoryListable: ListableEntity {
    fn scope_key(
        record: &Self::Record,
    ) -> (OwnerID, Option<OrganizationID>, bool);

    fn record_id(record: &Self::Record) -> Uuid;

    fn search_haystack(record: &Self::Record) -> Option<&str>;

    /// Every non-search filter.
    fn matches(record: &Self::Record, filters: &Self::Filters) -> bool;

    fn compare(
        a: &Self::Record,
        b: &Self::Record,
        key: Self::SortKey,
        direction: SortDirection,
    ) -> Ordering;
}

/// Runs one listing over `records`. `page` must already be normalized.
pub fn paginate<'a, E>(
    records: impl IntoIterator<Item = &'a E::Record>,
    scope: &ScopePredicate,
    query: &ListQuery<E::Filters, E::SortKey>,
    page: PageRequest,
) -> Page<E::Record>
where
    E: MemoryListable,
    E::Record: Clone + 'a,
{
    let needle = non_blank(E::search_text(&query.filters)).map(str::to_lowercase);

    let mut matching: Vec<&E::Record> = records
        .into_iter()
        .filter(|record| {
            let (owner, org, deleted) = E::scope_key(record);
            scope.admits(owner, org, deleted)
        })
        .filter(|record| E::matches(record, &query.filters))
        .filter(|record| match needle.as_deref() {
            None => true,
            Some(needle) => E::search_haystack(record)
                .is_some_and(|text| text.to_lowercase().contains(needle)),
        })
        .collect();

    let total = matching.len() as u64;

    matching.sort_by(|a, b| {
        E::compare(a, b, query.sort, query.direction)
            .then_with(|| tie_break(&E::record_id(a), &E::record_id(b)))
    });

    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = matching
        .into_iter()
        .skip(offset)
        .take(page.limit_or_default() as usize)
        .cloned()
        .collect();

    Page::new(items, page, total)
}

impl MemoryListable for MediaAssetListing {
    fn scope_key(asset: &MediaAsset) -> (OwnerID, Option<OrganizationID>, bool) {
        (asset.owner_id, None, asset.is_deleted())
    }

    fn record_id(asset: &MediaAsset) -> Uuid {
        asset.id.to_uuid()
    }

    fn search_haystack(asset: &MediaAsset) -> Option<&str> {
        asset.title.as_deref()
    }

    fn matches(asset: &MediaAsset, filters: &MediaAssetFilters) -> bool {
        filters.kind.is_none_or(|kind| asset.kind == kind)
            && filters.status.is_none_or(|status| asset.status == status)
    }

    fn compare(
        a: &MediaAsset,
        b: &MediaAsset,
        key: MediaAssetSortKey,
        direction: SortDirection,
    ) -> Ordering {
        match key {
            MediaAssetSortKey::CreatedAt => {
                directed(a.created_at.cmp(&b.created_at), direction)
            }
            MediaAssetSortKey::ReadyAt => {
                compare_nulls_last(a.ready_at, b.ready_at, direction)
            }
            MediaAssetSortKey::FileSize => {
                directed(a.file_size.cmp(&b.file_size), direction)
            }
            MediaAssetSortKey::Title => compare_nulls_last(
                a.title.as_deref(),
                b.title.as_deref(),
                direction,
            ),
        }
    }
}

impl MemoryListable for ContentItemListing {
    fn scope_key(item: &ContentItem) -> (OwnerID, Option<OrganizationID>, bool) {
        (item.owner_id, item.organization_id, item.is_deleted())
    }

    fn record_id(item: &ContentItem) -> Uuid {
        item.id.to_uuid()
    }

    fn search_haystack(item: &ContentItem) -> Option<&str> {
        Some(item.title.as_str())
    }

    fn matches(item: &ContentItem, filters: &ContentItemFilters) -> bool {
        filters.kind.is_none_or(|kind| item.kind == kind)
            && filters
                .publication_status
                .is_none_or(|status| item.publication_status == status)
            && filters
                .visibility
                .is_none_or(|visibility| item.visibility == visibility)
            && filters
                .category
                .as_deref()
                .is_none_or(|category| item.category.as_deref() == Some(category))
            && filters
                .tag
                .as_deref()
                .is_none_or(|tag| item.tags.iter().any(|t| t == tag))
            && filters
                .media_asset_id
                .is_none_or(|asset| item.media_asset_id == Some(asset))
    }

    fn compare(
        a: &ContentItem,
        b: &ContentItem,
        key: ContentItemSortKey,
        direction: SortDirection,
    ) -> Ordering {
        match key {
            ContentItemSortKey::CreatedAt => {
                directed(a.created_at.cmp(&b.created_at), direction)
            }
            ContentItemSortKey::UpdatedAt => {
                directed(a.updated_at.cmp(&b.updated_at), direction)
            }
            ContentItemSortKey::PublishedAt => {
                compare_nulls_last(a.published_at, b.published_at, direction)
            }
            ContentItemSortKey::Title => {
                directed(a.title.cmp(&b.title), direction)
            }
            ContentItemSortKey::Price => {
                compare_nulls_last(a.price_cents, b.price_cents, direction)
            }
            ContentItemSortKey::ViewCount => {
                directed(a.view_count.cmp(&b.view_count), direction)
            }
            ContentItemSortKey::PurchaseCount => {
                directed(a.purchase_count.cmp(&b.purchase_count), direction)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use vellum_model::{
        ContentItemID, ContentKind, OwnershipScope, PublicationStatus,
        Visibility,
    };

    use super::*;

    fn item(owner: OwnerID, title: &str, slug: &str, minutes_ago: i64) -> ContentItem {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        ContentItem {
            id: ContentItemID::new(),
            owner_id: owner,
            organization_id: None,
            media_asset_id: None,
            title: title.to_string(),
            slug: slug.to_string(),
            kind: ContentKind::Written,
            visibility: Visibility::Public,
            price_cents: None,
            category: None,
            tags: Vec::new(),
            body: None,
            publication_status: PublicationStatus::Draft,
            published_at: None,
            view_count: 0,
            purchase_count: 0,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn scope_is_applied_before_filters() {
        let owner = OwnerID::new();
        let other = OwnerID::new();
        let mut deleted = item(owner, "Gone", "gone", 1);
        deleted.deleted_at = Some(Utc::now());
        let rows = vec![
            item(owner, "Mine", "mine", 3),
            item(other, "Theirs", "theirs", 2),
            deleted,
        ];

        let scope = ScopePredicate::scoped(&OwnershipScope::personal(owner));
        let query = ListQuery::<ContentItemFilters, ContentItemSortKey>::new();
        let page = paginate::<ContentItemListing>(
            &rows,
            &scope,
            &query,
            PageRequest::new(1, 10),
        );

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Mine");
    }

    #[test]
    fn search_is_case_insensitive_and_sorted() {
        let owner = OwnerID::new();
        let rows = vec![
            item(owner, "Cooking Basics", "cooking-basics", 5),
            item(owner, "Advanced COOKING", "advanced-cooking", 1),
            item(owner, "Gardening", "gardening", 3),
        ];
        let scope = ScopePredicate::scoped(&OwnershipScope::personal(owner));
        let query = ListQuery::new()
            .with_filters(ContentItemFilters {
                search: Some("cooking".into()),
                ..ContentItemFilters::default()
            })
            .sorted_by(ContentItemSortKey::Title, SortDirection::Ascending);

        let page = paginate::<ContentItemListing>(
            &rows,
            &scope,
            &query,
            PageRequest::new(1, 10),
        );

        let titles: Vec<_> = page.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Advanced COOKING", "Cooking Basics"]);
    }

    #[test]
    fn pages_past_the_end_are_empty_but_counted() {
        let owner = OwnerID::new();
        let rows: Vec<_> = (0..5)
            .map(|n| item(owner, &format!("Item {n}"), &format!("item-{n}"), n))
            .collect();
        let scope = ScopePredicate::scoped(&OwnershipScope::personal(owner));
        let query = ListQuery::<ContentItemFilters, ContentItemSortKey>::new();

        let last = paginate::<ContentItemListing>(&rows, &scope, &query, PageRequest::new(3, 2));
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.total_pages, 3);

        let beyond = paginate::<ContentItemListing>(&rows, &scope, &query, PageRequest::new(9, 2));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
    }
}
