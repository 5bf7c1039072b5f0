use crate::content_item::{ContentKind, PublicationStatus, Visibility};
use crate::ids::MediaAssetID;
use crate::macros::named_enum;
use crate::media_asset::{MediaAssetStatus, MediaKind};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

named_enum! {
    #[derive(Default)]
    pub enum SortDirection: "sort direction" {
        Ascending => "asc",
        #[default]
        Descending => "desc",
    }
}

/// 1-indexed page request. An unset `limit` takes the catalog's configured
/// default page size when the request is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    pub page: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limit: Option<u32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit: Some(limit),
        }
    }

    /// Page `page` at whatever size the catalog defaults to.
    pub fn numbered(page: u32) -> Self {
        Self { page, limit: None }
    }

    /// The requested limit, or [`DEFAULT_PAGE_SIZE`] when unset.
    pub fn limit_or_default(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Rows to skip before this page. Saturates instead of overflowing for
    /// absurd page numbers.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit_or_default())
    }
}

/// A bounded, counted slice of a result set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit_or_default(),
            total,
            total_pages: total_pages(total, request.limit_or_default()),
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// `ceil(total / limit)`; zero when the limit is zero.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(u64::from(limit))
    }
}

/// Filter, sort and pagination for one entity listing. The ownership scope
/// is passed separately and is never part of this value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListQuery<F, S> {
    #[cfg_attr(feature = "serde", serde(default))]
    pub filters: F,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sort: S,
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: SortDirection,
    #[cfg_attr(feature = "serde", serde(default))]
    pub page: PageRequest,
}

impl<F: Default, S: Default> ListQuery<F, S> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, S> ListQuery<F, S> {
    pub fn with_filters(mut self, filters: F) -> Self {
        self.filters = filters;
        self
    }

    pub fn sorted_by(mut self, sort: S, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = PageRequest::new(page, limit);
        self
    }

    /// Selects a page while leaving the size to the catalog default.
    pub fn page_number(mut self, page: u32) -> Self {
        self.page = PageRequest::numbered(page);
        self
    }
}

named_enum! {
    #[derive(Default)]
    pub enum MediaAssetSortKey: "media asset sort key" {
        #[default]
        CreatedAt => "created_at",
        ReadyAt => "ready_at",
        FileSize => "file_size",
        Title => "title",
    }
}

/// Allow-listed filters for media asset listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaAssetFilters {
    pub kind: Option<MediaKind>,
    pub status: Option<MediaAssetStatus>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

pub type MediaAssetQuery = ListQuery<MediaAssetFilters, MediaAssetSortKey>;

named_enum! {
    #[derive(Default)]
    pub enum ContentItemSortKey: "content item sort key" {
        #[default]
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        PublishedAt => "published_at",
        Title => "title",
        Price => "price",
        ViewCount => "view_count",
        PurchaseCount => "purchase_count",
    }
}

/// Allow-listed filters for content item listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentItemFilters {
    pub kind: Option<ContentKind>,
    pub publication_status: Option<PublicationStatus>,
    pub visibility: Option<Visibility>,
    pub category: Option<String>,
    /// Items carrying this tag.
    pub tag: Option<String>,
    pub media_asset_id: Option<MediaAssetID>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

pub type ContentItemQuery = ListQuery<ContentItemFilters, ContentItemSortKey>;
