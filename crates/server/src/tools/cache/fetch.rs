//! cache_fetch tool implementation.
//!
//! Runs one request through the interceptor. Requests the controller does
//! not handle (cross-origin, or before activation) are fetched directly and
//! never cached.

use cacheward_client::{Destination, InterceptOutcome, LifecycleController, Method, ProxyRequest, fetch};
use cacheward_core::ResponseSnapshot;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::json_result;

/// Input parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// "document" for page navigations, "subresource" (default) otherwise.
    #[serde(default)]
    pub destination: Option<String>,
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    pub url: String,
    pub method: String,
    /// network, cache, root-document, offline or passthrough.
    pub resolution: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<HeaderPair>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

impl CacheFetchOutput {
    fn new(request: &ProxyRequest, resolution: &str, response: &ResponseSnapshot) -> Self {
        Self {
            url: request.url().to_string(),
            method: request.method().to_string(),
            resolution: resolution.to_string(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            headers: response
                .headers
                .iter()
                .map(|(name, value)| HeaderPair { name: name.clone(), value: value.clone() })
                .collect(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }
}

fn build_request(controller: &LifecycleController, params: &CacheFetchParams) -> Result<ProxyRequest, ToolError> {
    let input = params.url.trim();
    if input.is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()));
    }

    let url = if input.contains("://") {
        fetch::canonicalize(input)
    } else {
        fetch::resolve(controller.origin(), input)
    }
    .map_err(|e| ToolError::InvalidInput(format!("{input}: {e}")))?;

    let method = match params.method.as_deref().map(str::trim) {
        None | Some("") => Method::GET,
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|_| ToolError::InvalidInput(format!("invalid method: {m}")))?,
    };

    let destination = match params.destination.as_deref() {
        Some(d) => d.parse::<Destination>().map_err(|e| ToolError::InvalidInput(e.to_string()))?,
        None => Destination::default(),
    };

    Ok(ProxyRequest::new(method, url, destination))
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(controller: &LifecycleController, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(controller, &params)?;

    let output = match controller.intercept(request).await {
        InterceptOutcome::Handled(handled) => {
            CacheFetchOutput::new(&handled.request, handled.resolution.as_str(), &handled.response)
        }
        InterceptOutcome::PassThrough(request) => {
            tracing::debug!(url = %request.url(), "not intercepted, fetching directly");
            let response = controller.fetcher().fetch(&request).await?;
            CacheFetchOutput::new(&request, "passthrough", &response.to_snapshot())
        }
    };

    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{can_bind_localhost, controller, json};
    use httpmock::Method::GET;
    use httpmock::MockServer;

    fn params(url: &str) -> CacheFetchParams {
        CacheFetchParams { url: url.to_string(), method: None, destination: None }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (ctl, _db) = controller("http://127.0.0.1:9/", "v1", &[]).await;
        assert!(fetch_impl(&ctl, params("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_invalid_method_and_destination() {
        let (ctl, _db) = controller("http://127.0.0.1:9/", "v1", &[]).await;

        let bad_method = CacheFetchParams { method: Some("GE T".into()), ..params("/") };
        assert!(fetch_impl(&ctl, bad_method).await.is_err());

        let bad_destination = CacheFetchParams { destination: Some("iframe".into()), ..params("/") };
        assert!(fetch_impl(&ctl, bad_destination).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_offline_synthesizes_503() {
        let (ctl, _db) = controller("http://127.0.0.1:9/", "v1", &[]).await;
        ctl.activate().await.unwrap();

        let result = fetch_impl(&ctl, params("/app.js")).await.unwrap();
        let output = json(&result);

        assert_eq!(output["resolution"], "offline");
        assert_eq!(output["status"], 503);
        assert_eq!(output["content_type"], "text/plain");
    }

    #[tokio::test]
    async fn test_fetch_lifecycle_over_http() {
        if !can_bind_localhost() {
            return;
        }

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).header("content-type", "text/html").body("<html>home</html>");
            })
            .await;
        let app = server
            .mock_async(|when, then| {
                when.method(GET).path("/app.js");
                then.status(200).header("content-type", "text/javascript").body("run()");
            })
            .await;

        let (ctl, db) = controller(&server.base_url(), "v1", &["/"]).await;

        let before = json(&fetch_impl(&ctl, params("/app.js")).await.unwrap());
        assert_eq!(before["resolution"], "passthrough");
        assert_eq!(before["body"], "run()");

        ctl.install().await.unwrap();
        ctl.activate().await.unwrap();

        let live = json(&fetch_impl(&ctl, params(&server.url("/app.js"))).await.unwrap());
        assert_eq!(live["resolution"], "network");
        assert_eq!(live["status"], 200);
        assert_eq!(live["body"], "run()");
        app.assert_hits_async(2).await;

        ctl.settle().await;
        assert_eq!(db.entry_count("v1").await.unwrap(), 2);
    }
}
