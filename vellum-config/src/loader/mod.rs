pub mod db_url;
pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    models::{
        CatalogConfig, Config, ConfigMetadata, DEFAULT_ACQUIRE_TIMEOUT,
        DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_PAGE_SIZE,
        DEFAULT_MIN_CONNECTIONS, DEFAULT_PAGE_SIZE, DatabaseConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};

use db_url::resolve_database_url;
use error::ConfigLoadError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("vellum.toml"),
        PathBuf::from("config/vellum.toml"),
    ]
});

/// A loaded configuration with the soft problems found along the way.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Use these values instead of reading `.env` and the process
    /// environment.
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env_config, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No vellum.toml detected; using environment variables and defaults",
                "Pass --config or set VELLUM_CONFIG to point at a configuration file",
            );
        }

        let config = compose_config(
            file_config.unwrap_or_default(),
            &env_config,
            config_path,
            env_file_loaded,
        )?;
        warnings.extend(validation::apply_guard_rails(&config)?);

        debug!(
            config_path = ?config.metadata.config_path,
            env_file_loaded,
            warnings = warnings.items.len(),
            "Configuration loaded"
        );
        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match result {
            Ok(()) => Ok(true),
            Err(err) if err.not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = if let Some(path) = &self.options.config_path {
            (path.clone(), true)
        } else if let Some(path) = &env_config.config_path {
            (path.clone(), true)
        } else if let Some(path) = DEFAULT_CONFIG_LOCATIONS
            .iter()
            .find(|candidate| candidate.exists())
        {
            (path.clone(), false)
        } else {
            return Ok((None, None));
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose_config(
    file: FileConfig,
    env: &EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        database: file_database,
        catalog: file_catalog,
    } = file;

    let resolved_url = resolve_database_url(env, &file_database)?;
    let (primary_url, database_url_source) = match resolved_url {
        Some((url, source)) => (Some(url), Some(source)),
        None => (None, None),
    };

    let acquire_timeout = match (
        env.database_acquire_timeout.as_deref(),
        file_database.acquire_timeout.as_deref(),
    ) {
        (Some(raw), _) => parse_duration("DATABASE_ACQUIRE_TIMEOUT", raw)?,
        (None, Some(raw)) => parse_duration("database.acquire_timeout", raw)?,
        (None, None) => DEFAULT_ACQUIRE_TIMEOUT,
    };

    let database = DatabaseConfig {
        primary_url,
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        min_connections: env
            .database_min_connections
            .or(file_database.min_connections)
            .unwrap_or(DEFAULT_MIN_CONNECTIONS),
        acquire_timeout,
    };

    let catalog = CatalogConfig {
        default_page_size: env
            .default_page_size
            .or(file_catalog.default_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE),
        max_page_size: env
            .max_page_size
            .or(file_catalog.max_page_size)
            .unwrap_or(DEFAULT_MAX_PAGE_SIZE),
    };

    Ok(Config {
        database,
        catalog,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
            database_url_source,
        },
    })
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{ConfigGuardRailError, DatabaseUrlSource};

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vellum.toml");
        fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn file_values_apply_and_env_overrides_them() {
        let (_dir, path) = write_config(
            r#"
            [database]
            url = "postgresql://app:pw@db/vellum"
            max_connections = 25
            acquire_timeout = "5s"

            [catalog]
            default_page_size = 10
            max_page_size = 50
            "#,
        );

        let load = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig {
                max_page_size: Some(40),
                ..EnvConfig::default()
            })
            .load()
            .expect("load");
        let config = load.config;

        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.catalog.default_page_size, 10);
        assert_eq!(config.catalog.max_page_size, 40);
        assert_eq!(
            config.metadata.database_url_source,
            Some(DatabaseUrlSource::ConfigFile)
        );
        assert_eq!(config.metadata.config_path.as_deref(), Some(path.as_path()));
        assert!(load.warnings.is_empty());

        let settings = config.database_settings().expect("settings");
        assert_eq!(settings.max_connections, 25);
        assert_eq!(config.page_limits().max_page_size, 40);
    }

    #[test]
    fn missing_database_url_is_only_a_warning() {
        let (_dir, path) = write_config("");
        let load = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig::default())
            .load()
            .expect("load");
        assert!(load.config.database_settings().is_none());
        assert!(
            load.warnings
                .items
                .iter()
                .any(|w| w.message.contains("No database URL"))
        );
        assert_eq!(load.config.catalog, CatalogConfig::default());
    }

    #[test]
    fn default_page_size_above_max_is_rejected() {
        let (_dir, path) = write_config(
            r#"
            [catalog]
            default_page_size = 200
            max_page_size = 100
            "#,
        );
        let err = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig::default())
            .load()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::PageSizeOrder { .. })
        ));
    }

    #[test]
    fn zero_max_page_size_is_rejected() {
        let (_dir, path) = write_config("");
        let err = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig {
                max_page_size: Some(0),
                ..EnvConfig::default()
            })
            .load()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::ZeroValue {
                field: "max_page_size"
            })
        ));
    }

    #[test]
    fn bad_duration_names_its_key() {
        let (_dir, path) = write_config(
            r#"
            [database]
            acquire_timeout = "soon"
            "#,
        );
        let err = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig::default())
            .load()
            .unwrap_err();
        match err {
            ConfigLoadError::InvalidDuration { key, value, .. } => {
                assert_eq!(key, "database.acquire_timeout");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_toml_reports_path() {
        let (_dir, path) = write_config("[database\nurl = 1");
        let err = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig::default())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }

    #[test]
    fn redacted_toml_masks_password() {
        let (_dir, path) = write_config(
            r#"
            [database]
            url = "postgresql://app:hunter2@db/vellum"
            "#,
        );
        let config = ConfigLoader::new()
            .with_config_path(&path)
            .with_env(EnvConfig::default())
            .load()
            .expect("load")
            .config;
        let rendered = config.to_redacted_toml().expect("render");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("postgresql://app:****@db/vellum"));
        assert!(rendered.contains("acquire_timeout = \"30s\""));
    }
}
