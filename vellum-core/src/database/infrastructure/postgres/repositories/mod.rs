//! PostgreSQL-backed repository implementations.

pub mod content_items;
pub mod media_assets;
