//! Configuration for Vellum deployments.
//!
//! Settings come from an optional `vellum.toml`, a `.env` file and the
//! process environment, in increasing order of precedence. The loader
//! resolves the database URL (including secret files and composed
//! host/user/name parts), applies guard rails and reports soft problems as
//! warnings. `vellumctl` is the operator CLI built on top of it.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, db_url::DatabaseUrlSource,
    error::ConfigLoadError,
};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{CatalogConfig, Config, ConfigMetadata, DatabaseConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
