//! Repository ports (interfaces) for the catalog entities.
//!
//! Managers only ever talk to these traits. Every read-then-write sequence
//! runs on a transaction handle obtained from `begin`; dropping a handle
//! without calling `commit` discards everything it wrote.

pub mod content_items;
pub mod media_assets;

pub use content_items::{ContentItemRepository, ContentItemTransaction};
pub use media_assets::{AssetLookup, MediaAssetRepository, MediaAssetTransaction};
