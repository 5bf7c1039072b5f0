//! Core data model definitions shared across Vellum crates.
#![allow(missing_docs)]

mod macros;

pub mod content_item;
pub mod error;
pub mod ids;
pub mod listing;
pub mod media_asset;
pub mod patch;
pub mod scope;

pub use content_item::{
    ContentItem, ContentItemDetails, ContentItemPatch, ContentKind,
    NewContentItem, PublicationStatus, Visibility,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{ContentItemID, MediaAssetID, OrganizationID, OwnerID};
pub use listing::{
    ContentItemFilters, ContentItemQuery, ContentItemSortKey, ListQuery,
    MediaAssetFilters, MediaAssetQuery, MediaAssetSortKey, Page, PageRequest,
    SortDirection,
};
pub use media_asset::{
    MediaAsset, MediaAssetPatch, MediaAssetStatus, MediaKind, NewMediaAsset,
    ReadyRendition, TranscodingOutcome,
};
pub use scope::OwnershipScope;
