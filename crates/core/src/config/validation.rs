//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Parse `origin` into an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute
    /// http or https URL with a host.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.origin.trim()).map_err(|e| ConfigError::invalid("origin", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid("origin", format!("unsupported scheme: {}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::invalid("origin", "must include a host"));
        }
        Ok(url)
    }

    /// Whether some manifest entry names the root document once both are
    /// resolved against `origin` and stripped of fragments.
    pub fn root_document_listed(&self, origin: &Url) -> bool {
        let Some(root) = resolve_normalized(origin, &self.root_document) else {
            return false;
        };
        self.assets
            .iter()
            .any(|a| resolve_normalized(origin, a).is_some_and(|u| u == root))
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is empty or contains whitespace
    /// - `origin` is not an absolute http(s) URL
    /// - an asset or the root document resolves outside `origin`
    /// - `max_entry_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is set and below 100ms or above 5 minutes
    /// - `install_concurrency` is 0 or above 64
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set CACHEWARD_CACHE_VERSION for each deployment".into(),
            });
        }
        if self.cache_version.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid("cache_version", "must not contain whitespace"));
        }

        let origin = self.origin_url()?;

        for asset in &self.assets {
            let resolved =
                origin.join(asset).map_err(|e| ConfigError::invalid("assets", format!("{asset}: {e}")))?;
            if resolved.origin() != origin.origin() {
                return Err(ConfigError::invalid("assets", format!("{asset} is not on {}", self.origin)));
            }
        }

        let root = origin
            .join(&self.root_document)
            .map_err(|e| ConfigError::invalid("root_document", e.to_string()))?;
        if root.origin() != origin.origin() {
            return Err(ConfigError::invalid("root_document", format!("must be on {}", self.origin)));
        }

        if !self.root_document_listed(&origin) {
            tracing::warn!(
                root_document = %self.root_document,
                "root_document is not in the asset manifest; offline navigations will get the 503 fallback"
            );
        }

        if self.max_entry_bytes == 0 {
            return Err(ConfigError::invalid("max_entry_bytes", "must be greater than 0"));
        }
        if self.max_entry_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::invalid("max_entry_bytes", "must not exceed 50MB"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.install_concurrency == 0 || self.install_concurrency > 64 {
            return Err(ConfigError::invalid("install_concurrency", "must be between 1 and 64"));
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        Ok(())
    }
}

fn resolve_normalized(origin: &Url, input: &str) -> Option<Url> {
    let mut url = origin.join(input.trim()).ok()?;
    url.set_fragment(None);
    Some(url)
}
