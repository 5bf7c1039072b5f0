//! # Vellum Core
//!
//! Lifecycle management for the two catalog entities of a creator
//! publishing platform: media assets (uploaded video or audio files moving
//! through transcoding) and content items (the publishable, priceable units
//! that reference them).
//!
//! ## Overview
//!
//! - **Media assets**: registration, metadata edits, the
//!   `uploading -> uploaded -> transcoding -> ready | failed` status
//!   machine, and atomic recording of transcoding outcomes
//! - **Content items**: creation with media linkage, slug uniqueness per
//!   ownership scope, publish/unpublish/archive with media readiness gating
//! - **Listing**: scope-first filtering, free-text search, stable sorting and
//!   offset pagination with a real total count
//! - **Persistence**: repository ports with a PostgreSQL adapter and an
//!   in-process adapter sharing the same rules
//!
//! ## Feature Flags
//!
//! - `postgres` (default): SQLx-backed repositories and migrations
//! - `postgres-tests`: integration tests that need `DATABASE_URL`
//!
//! ## Examples
//!
//! ```no_run
//! use vellum_core::{CatalogServices, PageLimits};
//! use vellum_core::model::{NewContentItem, OwnerID, OwnershipScope};
//!
//! async fn seed() -> vellum_core::Result<()> {
//!     let services = CatalogServices::in_memory(PageLimits::default());
//!     let scope = OwnershipScope::personal(OwnerID::new());
//!     let item = services
//!         .content
//!         .create(NewContentItem::written("Welcome", "welcome"), &scope)
//!         .await?;
//!     services.content.publish(item.id, scope.owner_id).await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod application;
pub mod database;
pub mod domain;
pub mod error;
pub mod query;
pub mod validation;

pub use vellum_model as model;

pub use application::{CatalogServices, CatalogServicesBuilder};
pub use database::MemoryCatalog;
#[cfg(feature = "postgres")]
pub use database::{DatabaseSettings, PostgresCatalog};
pub use domain::{ContentManager, MediaAssetManager};
pub use error::{CatalogError, CatalogErrorKind, EntityKind, Result};
pub use query::PageLimits;

/// Embedded schema migrations for the Postgres adapter.
#[cfg(feature = "postgres")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
