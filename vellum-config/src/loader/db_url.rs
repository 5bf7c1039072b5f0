use std::{fs::read_to_string, path::Path};

use url::Url;

use crate::{
    ConfigLoadError,
    models::sources::{EnvConfig, FileDatabaseConfig},
};

/// Where the effective PostgreSQL connection URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseUrlSource {
    /// `DATABASE_URL`.
    Env,
    /// The file named by `DATABASE_URL_FILE`.
    SecretFile,
    /// `database.url` in the TOML file.
    ConfigFile,
    /// Built from `DATABASE_HOST` / `DATABASE_USER` / `DATABASE_NAME`.
    Composed,
}

impl DatabaseUrlSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseUrlSource::Env => "DATABASE_URL",
            DatabaseUrlSource::SecretFile => "DATABASE_URL_FILE",
            DatabaseUrlSource::ConfigFile => "config file",
            DatabaseUrlSource::Composed => "DATABASE_HOST/USER/NAME",
        }
    }
}

pub fn resolve_database_url(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<(String, DatabaseUrlSource)>, ConfigLoadError> {
    if let Some(url) = env
        .database_url
        .clone()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(Some((url, DatabaseUrlSource::Env)));
    }

    if let Some(path) = env.database_url_file.as_ref()
        && let Some(url) = read_secret_file(path)?
    {
        return Ok(Some((url, DatabaseUrlSource::SecretFile)));
    }

    if let Some(ref stored_url) = file_database.url {
        let trimmed = stored_url.trim();
        if !trimmed.is_empty() {
            let mut parsed = Url::parse(trimmed).map_err(|source| {
                ConfigLoadError::InvalidDatabaseUrl { source }
            })?;
            if parsed.password().is_none()
                && let Some(password) =
                    resolve_database_password(env, file_database)?
            {
                parsed.set_password(Some(&password)).map_err(|_| {
                    ConfigLoadError::InvalidDatabasePassword
                })?;
            }
            return Ok(Some((parsed.to_string(), DatabaseUrlSource::ConfigFile)));
        }
    }

    let host = env
        .database_host
        .clone()
        .filter(|value| !value.trim().is_empty());
    let user = env
        .database_user
        .clone()
        .filter(|value| !value.trim().is_empty());
    let name = env
        .database_name
        .clone()
        .filter(|value| !value.trim().is_empty());

    if let (Some(host), Some(user), Some(name)) = (host, user, name) {
        let port = env.database_port.unwrap_or(5432);
        let mut url = Url::parse(&format!("postgresql://{host}:{port}/{name}"))
            .map_err(|source| ConfigLoadError::InvalidDatabaseUrl {
                source,
            })?;
        url.set_username(&user).map_err(|_| {
            ConfigLoadError::InvalidDatabaseUsername {
                username: user.clone(),
            }
        })?;
        if let Some(password) = resolve_database_password(env, file_database)? {
            url.set_password(Some(&password)).map_err(|_| {
                ConfigLoadError::InvalidDatabasePassword
            })?;
        }
        return Ok(Some((url.to_string(), DatabaseUrlSource::Composed)));
    }

    Ok(None)
}

pub fn resolve_database_password(
    env: &EnvConfig,
    file_database: &FileDatabaseConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(password) = env
        .database_password
        .clone()
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(Some(password));
    }

    for path in [
        env.database_password_file.as_ref(),
        file_database.password_file.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(secret) = read_secret_file(path)? {
            return Ok(Some(secret));
        }
    }

    Ok(None)
}

pub fn read_secret_file(
    path: &Path,
) -> Result<Option<String>, ConfigLoadError> {
    let contents = read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn explicit_url_wins() {
        let env = EnvConfig {
            database_url: Some("postgresql://env@db/vellum".into()),
            database_host: Some("ignored".into()),
            ..EnvConfig::default()
        };
        let file = FileDatabaseConfig {
            url: Some("postgresql://file@db/vellum".into()),
            ..FileDatabaseConfig::default()
        };
        let (url, source) = resolve_database_url(&env, &file)
            .expect("resolve")
            .expect("url");
        assert_eq!(url, "postgresql://env@db/vellum");
        assert_eq!(source, DatabaseUrlSource::Env);
    }

    #[test]
    fn file_url_picks_up_password_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let secret = dir.path().join("db_password");
        fs::write(&secret, "s3cret\n").expect("write secret");

        let env = EnvConfig::default();
        let file = FileDatabaseConfig {
            url: Some("postgresql://app@db:5432/vellum".into()),
            password_file: Some(secret),
            ..FileDatabaseConfig::default()
        };
        let (url, source) = resolve_database_url(&env, &file)
            .expect("resolve")
            .expect("url");
        assert_eq!(url, "postgresql://app:s3cret@db:5432/vellum");
        assert_eq!(source, DatabaseUrlSource::ConfigFile);
    }

    #[test]
    fn composes_url_from_parts() {
        let env = EnvConfig {
            database_host: Some("db".into()),
            database_port: Some(6543),
            database_user: Some("vellum".into()),
            database_name: Some("catalog".into()),
            database_password: Some("pw".into()),
            ..EnvConfig::default()
        };
        let (url, source) =
            resolve_database_url(&env, &FileDatabaseConfig::default())
                .expect("resolve")
                .expect("url");
        assert_eq!(url, "postgresql://vellum:pw@db:6543/catalog");
        assert_eq!(source, DatabaseUrlSource::Composed);
    }

    #[test]
    fn nothing_configured_is_none() {
        let resolved = resolve_database_url(
            &EnvConfig::default(),
            &FileDatabaseConfig::default(),
        )
        .expect("resolve");
        assert!(resolved.is_none());
    }

    #[test]
    fn missing_secret_file_is_an_error() {
        let env = EnvConfig {
            database_url_file: Some("/nonexistent/vellum/db_url".into()),
            ..EnvConfig::default()
        };
        let err = resolve_database_url(&env, &FileDatabaseConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::SecretFileIo { .. }));
    }
}
