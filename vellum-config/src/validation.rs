use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },
    #[error(
        "default page size {default_page_size} exceeds max page size {max_page_size}"
    )]
    PageSizeOrder {
        default_page_size: u32,
        max_page_size: u32,
    },
    #[error(
        "minimum connections {min_connections} exceed maximum connections {max_connections}"
    )]
    ConnectionBounds {
        min_connections: u32,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let catalog = &config.catalog;
    let database = &config.database;

    if catalog.max_page_size == 0 {
        return Err(ConfigGuardRailError::ZeroValue {
            field: "max_page_size",
        });
    }
    if catalog.default_page_size == 0 {
        return Err(ConfigGuardRailError::ZeroValue {
            field: "default_page_size",
        });
    }
    if catalog.default_page_size > catalog.max_page_size {
        return Err(ConfigGuardRailError::PageSizeOrder {
            default_page_size: catalog.default_page_size,
            max_page_size: catalog.max_page_size,
        });
    }

    if database.max_connections == 0 {
        return Err(ConfigGuardRailError::ZeroValue {
            field: "max_connections",
        });
    }
    if database.min_connections > database.max_connections {
        return Err(ConfigGuardRailError::ConnectionBounds {
            min_connections: database.min_connections,
            max_connections: database.max_connections,
        });
    }

    if database.settings().is_none() {
        warnings.push_with_hint(
            "No database URL configured; only the in-memory catalog is available",
            "Set DATABASE_URL, DATABASE_URL_FILE, or database.url in vellum.toml",
        );
    }

    if catalog.max_page_size > 1_000 {
        warnings.push(format!(
            "max_page_size of {} allows very large listing pages",
            catalog.max_page_size
        ));
    }

    Ok(warnings)
}
