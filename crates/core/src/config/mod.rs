//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CACHEWARD_*)
//! 2. TOML config file (if CACHEWARD_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The cache version and the asset manifest are deploy-time inputs: they are
//! read once here and handed to the lifecycle controller, never consulted
//! through a global.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::manifest::{AssetManifest, CacheVersion};

mod validation;

pub use validation::ConfigError;

/// Freshness strategy used when intercepting same-origin requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Live network first, cache only when the network is unreachable.
    #[default]
    NetworkFirst,
    /// Cached entry when present, network otherwise.
    CacheFirst,
    /// Cached entry when present, refreshed from the network in the background.
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CACHEWARD_*)
/// 2. TOML config file (if CACHEWARD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Current cache version; names the namespace that survives activation.
    ///
    /// Set via CACHEWARD_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// The application's own origin. Only requests to this origin are cached.
    ///
    /// Set via CACHEWARD_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ordered asset manifest, resolved against `origin`.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Document served for navigations when offline and uncached.
    ///
    /// Set via CACHEWARD_ROOT_DOCUMENT environment variable.
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// Interception strategy.
    ///
    /// Set via CACHEWARD_STRATEGY environment variable.
    #[serde(default)]
    pub strategy: Strategy,

    /// Path to SQLite cache database.
    ///
    /// Set via CACHEWARD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via CACHEWARD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest response body accepted into the cache, in bytes.
    ///
    /// Set via CACHEWARD_MAX_ENTRY_BYTES environment variable.
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: usize,

    /// Optional HTTP request timeout in milliseconds.
    ///
    /// Unset means the HTTP client's own default applies.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Number of manifest entries fetched concurrently during install.
    ///
    /// Set via CACHEWARD_INSTALL_CONCURRENCY environment variable.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_assets() -> Vec<String> {
    vec!["/".into()]
}

fn default_root_document() -> String {
    "/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cacheward-cache.sqlite")
}

fn default_user_agent() -> String {
    "cacheward/0.1".into()
}

fn default_max_entry_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_install_concurrency() -> usize {
    8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_origin(),
            assets: default_assets(),
            root_document: default_root_document(),
            strategy: Strategy::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_entry_bytes: default_max_entry_bytes(),
            timeout_ms: None,
            install_concurrency: default_install_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The versioned manifest described by this configuration.
    pub fn manifest(&self) -> AssetManifest {
        AssetManifest::new(CacheVersion::new(self.cache_version.clone()), self.assets.clone())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CACHEWARD_`
    /// 2. TOML file from `CACHEWARD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CACHEWARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CACHEWARD_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
