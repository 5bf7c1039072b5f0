//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

pub use repositories::content_items::PostgresContentItemRepository;
pub use repositories::media_assets::PostgresMediaAssetRepository;
