//! cache_install tool implementation.

use cacheward_client::{InstallReport, LifecycleController};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInstallOutput {
    /// Namespace that was populated.
    pub version: String,
    /// Number of manifest entries stored.
    pub cached: usize,
    /// Entries that could not be stored, in manifest order.
    pub failed: Vec<FailedAsset>,
    /// Whether the new version may be activated immediately.
    pub skip_waiting: bool,
    /// ISO8601 timestamp of the install pass.
    pub installed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedAsset {
    pub asset: String,
    pub url: Option<String>,
    pub error: String,
}

impl From<InstallReport> for CacheInstallOutput {
    fn from(report: InstallReport) -> Self {
        let failed = report
            .failed()
            .map(|e| FailedAsset {
                asset: e.asset.clone(),
                url: e.url.clone(),
                error: e.error.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            cached: report.cached_count(),
            version: report.version,
            failed,
            skip_waiting: report.skip_waiting,
            installed_at: report.installed_at,
        }
    }
}

/// Implementation of the cache_install tool.
pub async fn install_impl(controller: &LifecycleController) -> Result<CallToolResult, McpError> {
    let report = controller.install().await?;
    Ok(json_result(&CacheInstallOutput::from(report))?)
}
