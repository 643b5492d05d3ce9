//! cache_status tool implementation.

use cacheward_client::LifecycleController;
use cacheward_core::NamespaceInfo;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    /// Current cache version.
    pub version: String,
    /// Lifecycle state: parsed, installing, installed, activating or activated.
    pub state: String,
    /// Interception strategy in use.
    pub strategy: String,
    /// Origin whose requests are intercepted.
    pub origin: String,
    /// Every namespace in the store with its entry count.
    pub namespaces: Vec<NamespaceInfo>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(controller: &LifecycleController) -> Result<CallToolResult, McpError> {
    let namespaces = controller.store().namespaces().await?;

    let output = CacheStatusOutput {
        version: controller.version().to_string(),
        state: controller.state().await.as_str().to_string(),
        strategy: controller.strategy().as_str().to_string(),
        origin: controller.origin().to_string(),
        namespaces,
    };

    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{controller, json};

    #[tokio::test]
    async fn test_status_fresh_controller() {
        let (ctl, db) = controller("http://127.0.0.1:9/", "v1", &["/"]).await;
        db.open_namespace("v0").await.unwrap();

        let result = status_impl(&ctl).await.unwrap();
        let output = json(&result);

        assert_eq!(output["version"], "v1");
        assert_eq!(output["state"], "parsed");
        assert_eq!(output["strategy"], "network-first");
        assert_eq!(output["namespaces"][0]["name"], "v0");
        assert_eq!(output["namespaces"][0]["entries"], 0);
    }
}
