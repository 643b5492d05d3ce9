//! Versioned asset manifest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque deployment version. Doubles as the name of the cache namespace
/// that is current for this deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string comparison against a stored namespace name.
    pub fn is_namespace(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of resources that must be available offline for one
/// version. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    version: CacheVersion,
    assets: Vec<String>,
}

impl AssetManifest {
    pub fn new(version: CacheVersion, assets: Vec<String>) -> Self {
        Self { version, assets }
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exact_match() {
        let v = CacheVersion::new("rfx-effects-v201");
        assert!(v.is_namespace("rfx-effects-v201"));
        assert!(!v.is_namespace("rfx-effects-v20"));
        assert!(!v.is_namespace("RFX-EFFECTS-V201"));
        assert_eq!(v.to_string(), "rfx-effects-v201");
    }

    #[test]
    fn test_manifest_accessors() {
        let manifest = AssetManifest::new(CacheVersion::new("v1"), vec!["/".into(), "/app.js".into()]);
        assert_eq!(manifest.len(), 2);
        assert!(!manifest.is_empty());
        assert_eq!(manifest.assets()[1], "/app.js");
    }
}
