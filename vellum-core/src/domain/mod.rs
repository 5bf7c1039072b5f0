//! Business rules for the two catalog entities.

pub mod content;
pub mod media_assets;

pub use content::ContentManager;
pub use media_assets::MediaAssetManager;
