//! cache_activate tool implementation.

use cacheward_client::{ActivateReport, LifecycleController};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheActivateOutput {
    /// Namespace that is now current.
    pub version: String,
    /// Stale namespaces deleted.
    pub evicted: Vec<String>,
    /// Stale namespaces that could not be deleted.
    pub retained: Vec<String>,
    pub clients_claimed: bool,
}

impl From<ActivateReport> for CacheActivateOutput {
    fn from(report: ActivateReport) -> Self {
        Self {
            version: report.version,
            evicted: report.evicted,
            retained: report.retained,
            clients_claimed: report.clients_claimed,
        }
    }
}

/// Implementation of the cache_activate tool.
pub async fn activate_impl(controller: &LifecycleController) -> Result<CallToolResult, McpError> {
    let report = controller.activate().await?;
    Ok(json_result(&CacheActivateOutput::from(report))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{controller, json};

    #[tokio::test]
    async fn test_activate_evicts_previous_versions() {
        let (ctl, db) = controller("http://127.0.0.1:9/", "v2", &[]).await;
        db.open_namespace("v1").await.unwrap();
        db.open_namespace("v2").await.unwrap();

        let result = activate_impl(&ctl).await.unwrap();
        let output = json(&result);

        assert_eq!(output["version"], "v2");
        assert_eq!(output["evicted"], serde_json::json!(["v1"]));
        assert_eq!(output["clients_claimed"], true);
        assert!(!db.list_namespaces().await.unwrap().contains("v1"));
    }
}
