use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::MemoryCatalog;
use crate::database::ports::{ContentItemRepository, MediaAssetRepository};
#[cfg(feature = "postgres")]
use crate::database::{DatabaseSettings, PostgresCatalog};
use crate::domain::{ContentManager, MediaAssetManager};
#[cfg(feature = "postgres")]
use crate::error::Result;
use crate::query::PageLimits;

/// Both catalog managers wired over shared repository ports.
///
/// Upstream layers hold one of these and call the managers directly; the
/// managers never reach each other except through the content side's
/// transaction-scoped asset lookup.
#[derive(Clone)]
pub struct CatalogServices {
    pub media_assets: MediaAssetManager<dyn MediaAssetRepository>,
    pub content: ContentManager<dyn ContentItemRepository>,
}

impl fmt::Debug for CatalogServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogServices")
            .field("media_assets", &self.media_assets)
            .field("content", &self.content)
            .finish()
    }
}

impl CatalogServices {
    pub fn builder() -> CatalogServicesBuilder {
        CatalogServicesBuilder::new()
    }

    /// Services over a fresh process-local store.
    pub fn in_memory(limits: PageLimits) -> Self {
        let store = Arc::new(MemoryCatalog::new());
        Self::assemble(store.clone(), store, limits)
    }

    /// Services over the repositories of an open Postgres catalog.
    #[cfg(feature = "postgres")]
    pub fn postgres(catalog: &PostgresCatalog, limits: PageLimits) -> Self {
        Self::assemble(catalog.media_assets(), catalog.content_items(), limits)
    }

    /// Opens a pool from `settings` and wires services over it.
    #[cfg(feature = "postgres")]
    pub async fn connect(
        settings: &DatabaseSettings,
        limits: PageLimits,
    ) -> Result<(Self, PostgresCatalog)> {
        let catalog = PostgresCatalog::connect(settings).await?;
        Ok((Self::postgres(&catalog, limits), catalog))
    }

    fn assemble(
        media_assets: Arc<dyn MediaAssetRepository>,
        content_items: Arc<dyn ContentItemRepository>,
        limits: PageLimits,
    ) -> Self {
        Self {
            media_assets: MediaAssetManager::new(media_assets)
                .with_page_limits(limits),
            content: ContentManager::new(content_items).with_page_limits(limits),
        }
    }
}

#[derive(Default)]
pub struct CatalogServicesBuilder {
    media_assets: Option<Arc<dyn MediaAssetRepository>>,
    content_items: Option<Arc<dyn ContentItemRepository>>,
    limits: Option<PageLimits>,
}

impl fmt::Debug for CatalogServicesBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogServicesBuilder")
            .field(
                "media_assets",
                &self.media_assets.as_ref().map(|r| type_name_of_val(r.as_ref())),
            )
            .field(
                "content_items",
                &self.content_items.as_ref().map(|r| type_name_of_val(r.as_ref())),
            )
            .field("limits", &self.limits)
            .finish()
    }
}

impl CatalogServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_assets(
        mut self,
        repo: Arc<dyn MediaAssetRepository>,
    ) -> Self {
        self.media_assets = Some(repo);
        self
    }

    pub fn with_content_items(
        mut self,
        repo: Arc<dyn ContentItemRepository>,
    ) -> Self {
        self.content_items = Some(repo);
        self
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Build validated services. Returns a string error if a repository is
    /// missing.
    pub fn build(self) -> std::result::Result<CatalogServices, String> {
        let media_assets = self
            .media_assets
            .ok_or_else(|| "missing MediaAssetRepository".to_string())?;
        let content_items = self
            .content_items
            .ok_or_else(|| "missing ContentItemRepository".to_string())?;
        Ok(CatalogServices::assemble(
            media_assets,
            content_items,
            self.limits.unwrap_or_default(),
        ))
    }
}
