//! Lifecycle states and the results handed back to the host.

use cacheward_core::ResponseSnapshot;
use serde::Serialize;

use crate::policy::Resolution;
use crate::request::ProxyRequest;

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed, nothing cached yet.
    Parsed,
    Installing,
    /// Populated; may be activated straight away.
    Installed,
    Activating,
    /// Stale namespaces evicted; every same-origin request is intercepted.
    Activated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
        }
    }
}

/// Result of caching one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallEntry {
    /// Entry as written in the manifest.
    pub asset: String,
    /// Resolved URL, when the entry could be resolved.
    pub url: Option<String>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallEntry {
    pub(crate) fn cached(asset: &str, url: &str) -> Self {
        Self { asset: asset.to_string(), url: Some(url.to_string()), cached: true, error: None }
    }

    pub(crate) fn failed(asset: &str, url: Option<&str>, error: impl Into<String>) -> Self {
        Self { asset: asset.to_string(), url: url.map(str::to_string), cached: false, error: Some(error.into()) }
    }
}

/// Outcome of an install pass, entries in manifest order.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub entries: Vec<InstallEntry>,
    /// Always true: population does not depend on in-flight traffic, so the
    /// new version may be activated without waiting for the old one.
    pub skip_waiting: bool,
    pub installed_at: String,
}

impl InstallReport {
    pub fn cached_count(&self) -> usize {
        self.entries.iter().filter(|e| e.cached).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstallEntry> {
        self.entries.iter().filter(|e| !e.cached)
    }
}

/// Outcome of an activation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub version: String,
    /// Stale namespaces deleted.
    pub evicted: Vec<String>,
    /// Stale namespaces whose deletion failed; retried on the next activation.
    pub retained: Vec<String>,
    /// Always true: the next intercepted request uses this controller.
    pub clients_claimed: bool,
}

/// A request that was handled by the interceptor.
#[derive(Debug, Clone)]
pub struct Interception {
    pub request: ProxyRequest,
    pub response: ResponseSnapshot,
    pub resolution: Resolution,
}

/// What the host should do with a request it offered to the controller.
#[derive(Debug, Clone)]
pub enum InterceptOutcome {
    /// The controller produced the response.
    Handled(Interception),
    /// Not intercepted (cross-origin, or no active controller); the host
    /// performs the request itself and nothing is cached.
    PassThrough(ProxyRequest),
}

impl InterceptOutcome {
    pub fn handled(self) -> Option<Interception> {
        match self {
            InterceptOutcome::Handled(interception) => Some(interception),
            InterceptOutcome::PassThrough(_) => None,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, InterceptOutcome::PassThrough(_))
    }
}
