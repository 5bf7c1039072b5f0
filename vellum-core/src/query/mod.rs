//! Shared listing engine used by both managers.
//!
//! A listing is `{scope, filters, sort, page}`. The scope predicate
//! (owner match, not soft-deleted, and for scoped entities the exact
//! organization) is applied by the engine itself before any caller filter,
//! so no filter value can widen what a caller sees. Backends plug in through
//! [`ListableEntity`]; the Postgres and in-memory stores each provide one
//! routine that works for every entity.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::cmp::Ordering;

use uuid::Uuid;
use vellum_model::{
    ContentItem, ContentItemFilters, ContentItemSortKey, ListQuery, MediaAsset,
    MediaAssetFilters, MediaAssetSortKey, OrganizationID, OwnerID,
    OwnershipScope, PageRequest, SortDirection,
    listing::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

use crate::{
    error::{Result, ValidationErrors},
    validation::validate_search,
};

/// Bounds applied to every page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size.max(1)),
            max_page_size: max_page_size.max(1),
        }
    }

    /// Fills an unset limit with `default_page_size`, rejects zero
    /// pages/limits and clamps the limit to `max_page_size`. The result
    /// always carries a limit.
    pub fn normalize(&self, request: PageRequest) -> Result<PageRequest> {
        let limit = request.limit.unwrap_or(self.default_page_size);

        let mut errors = ValidationErrors::new();
        if request.page == 0 {
            errors.push("page", "pages are numbered from 1");
        }
        if limit == 0 {
            errors.push("limit", "must be greater than zero");
        }
        errors.into_result()?;

        Ok(PageRequest::new(request.page, limit.min(self.max_page_size)))
    }
}

/// How the organization column participates in the scope predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationMatch {
    /// The entity has no organization column.
    NotApplicable,
    /// Rows must carry exactly this organization (`None` = personal rows).
    Exactly(Option<OrganizationID>),
}

/// The predicate every listing starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopePredicate {
    pub owner_id: OwnerID,
    pub organization: OrganizationMatch,
}

impl ScopePredicate {
    pub fn owner(owner_id: OwnerID) -> Self {
        Self {
            owner_id,
            organization: OrganizationMatch::NotApplicable,
        }
    }

    pub fn scoped(scope: &OwnershipScope) -> Self {
        Self {
            owner_id: scope.owner_id,
            organization: OrganizationMatch::Exactly(scope.organization_id),
        }
    }

    /// In-process form of the predicate.
    pub fn admits(
        &self,
        owner_id: OwnerID,
        organization_id: Option<OrganizationID>,
        deleted: bool,
    ) -> bool {
        if deleted || owner_id != self.owner_id {
            return false;
        }
        match self.organization {
            OrganizationMatch::NotApplicable => true,
            OrganizationMatch::Exactly(expected) => expected == organization_id,
        }
    }
}

/// Describes one listable entity: its filter set and its sort keys.
pub trait ListableEntity {
    type Filters: Send + Sync;
    type SortKey: Copy + Send + Sync;
    type Record: Send;

    /// The single case-insensitive substring filter, if set and non-blank.
    fn search_text(filters: &Self::Filters) -> Option<&str>;
}

/// Marker for media asset listings.
#[derive(Debug, Clone, Copy)]
pub struct MediaAssetListing;

/// Marker for content item listings.
#[derive(Debug, Clone, Copy)]
pub struct ContentItemListing;

impl ListableEntity for MediaAssetListing {
    type Filters = MediaAssetFilters;
    type SortKey = MediaAssetSortKey;
    type Record = MediaAsset;

    fn search_text(filters: &MediaAssetFilters) -> Option<&str> {
        filters.search.as_deref()
    }
}

impl ListableEntity for ContentItemListing {
    type Filters = ContentItemFilters;
    type SortKey = ContentItemSortKey;
    type Record = ContentItem;

    fn search_text(filters: &ContentItemFilters) -> Option<&str> {
        filters.search.as_deref()
    }
}

/// Checks that need no datastore: page bounds and search length.
pub fn prepare<E: ListableEntity>(
    query: &ListQuery<E::Filters, E::SortKey>,
    limits: &PageLimits,
) -> Result<PageRequest> {
    validate_search(E::search_text(&query.filters))?;
    limits.normalize(query.page)
}

/// Orders two optional sort values with `None` always last, then applies the
/// direction to the present values only.
pub fn compare_nulls_last<T: Ord>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b), direction),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Final tie-break so pages are stable when sort values collide.
pub fn tie_break(a: &Uuid, b: &Uuid) -> Ordering {
    a.cmp(b)
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
