pub mod sources;

use std::{path::PathBuf, time::Duration};

use vellum_core::{DatabaseSettings, PageLimits};

use crate::{
    loader::db_url::DatabaseUrlSource,
    models::sources::{FileCatalogConfig, FileConfig, FileDatabaseConfig},
    util::redact_url,
};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Connection settings, or `None` when no database URL was resolved.
    pub fn database_settings(&self) -> Option<DatabaseSettings> {
        self.database.settings()
    }

    pub fn page_limits(&self) -> PageLimits {
        self.catalog.page_limits()
    }

    /// The effective configuration as TOML with the database password
    /// masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let file = FileConfig {
            database: FileDatabaseConfig {
                url: self.database.primary_url.as_deref().map(redact_url),
                password_file: None,
                max_connections: Some(self.database.max_connections),
                min_connections: Some(self.database.min_connections),
                acquire_timeout: Some(
                    humantime::format_duration(self.database.acquire_timeout)
                        .to_string(),
                ),
            },
            catalog: FileCatalogConfig {
                default_page_size: Some(self.catalog.default_page_size),
                max_page_size: Some(self.catalog.max_page_size),
            },
        };
        toml::to_string(&file)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub primary_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn settings(&self) -> Option<DatabaseSettings> {
        let url = self
            .primary_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())?;
        Some(DatabaseSettings {
            url: url.to_string(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: self.acquire_timeout,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits::new(self.default_page_size, self.max_page_size)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    pub database_url_source: Option<DatabaseUrlSource>,
}
