use crate::catalog::normalize::{
    Normalizer, DEFAULT_API_BASE_URL, DEFAULT_CURRENCY_SYMBOL, DEFAULT_PLACEHOLDER_IMAGE,
    DEFAULT_UPLOADS_PATH,
};
use crate::catalog::types::{DEFAULT_FEATURED_LIMIT, DEFAULT_LISTINGS_LIMIT, DEFAULT_PAGE_SIZE};
use crate::catalog::ClientOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "realty-catalog.toml";
/// Environment overrides, e.g. `CATALOG__API__BASE_URL`
pub const ENV_PREFIX: &str = "CATALOG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub catalog: CatalogSettings,
}

/// Backend connection
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    /// Root serving `controllers/` and `uploads/`
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            request_timeout_secs: 15,
            user_agent: None,
        }
    }
}

/// Catalog presentation
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSettings {
    pub listings_limit: u32,
    pub featured_limit: u32,
    pub page_size: usize,
    pub uploads_path: String,
    pub placeholder_image: String,
    pub currency_symbol: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            listings_limit: DEFAULT_LISTINGS_LIMIT,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            uploads_path: DEFAULT_UPLOADS_PATH.to_string(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl Settings {
    /// Layer defaults, then the TOML file, then `CATALOG__*` variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs.max(1))
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            auth_token: self.api.auth_token.clone(),
            user_agent: self.api.user_agent.clone(),
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.api.base_url.clone())
            .with_uploads_path(self.catalog.uploads_path.clone())
            .with_placeholder_image(self.catalog.placeholder_image.clone())
            .with_currency_symbol(self.catalog.currency_symbol.clone())
    }
}
