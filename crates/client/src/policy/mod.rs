//! Interception policy.
//!
//! Pure decisions only: given a request and what the network or the cache
//! produced, say what to serve and whether to write back. The lifecycle
//! controller performs the I/O.
//!
//! Network-first order, per request:
//! 1. live fetch, no timeout beyond the client default
//! 2. success-class response: serve it, refresh the cache in the background
//! 3. any other response (404, 500, ...): serve it as is, no caching, no fallback
//! 4. no response at all: cached entry, else the root document for
//!    navigations, else a synthesized 503

pub mod fallback;

use cacheward_core::{ResponseSnapshot, Strategy};
use serde::Serialize;

use crate::request::ProxyRequest;

pub use fallback::offline_response;

/// Where the response handed back to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    Network,
    Cache,
    /// Cached root document served in place of an unreachable navigation.
    RootDocument,
    /// Synthesized 503.
    Offline,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Network => "network",
            Resolution::Cache => "cache",
            Resolution::RootDocument => "root-document",
            Resolution::Offline => "offline",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::RootDocument | Resolution::Offline)
    }
}

/// What to do with a response obtained from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkDecision {
    /// Hand it back untouched.
    Serve,
    /// Hand it back and store a copy in the current namespace.
    ServeAndStore,
}

/// What to do when the network produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    ServeCached,
    /// Look up the root document; synthesize if that is missing too.
    TryRootDocument,
    Synthesize,
}

/// What to do with a cache hit found before going to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitDecision {
    Serve,
    ServeAndRevalidate,
}

pub fn on_network_response(request: &ProxyRequest, response: &ResponseSnapshot) -> NetworkDecision {
    if request.is_cacheable_method() && response.is_cacheable_status() {
        NetworkDecision::ServeAndStore
    } else {
        NetworkDecision::Serve
    }
}

pub fn on_network_failure(request: &ProxyRequest, cached: bool) -> FailureDecision {
    if cached {
        FailureDecision::ServeCached
    } else if request.is_document() {
        FailureDecision::TryRootDocument
    } else {
        FailureDecision::Synthesize
    }
}

/// Whether the strategy looks in the cache before touching the network.
pub fn consults_cache_first(strategy: Strategy) -> bool {
    !matches!(strategy, Strategy::NetworkFirst)
}

/// Decision for a cache hit under a cache-consulting strategy.
pub fn on_cache_hit(strategy: Strategy) -> CacheHitDecision {
    match strategy {
        Strategy::StaleWhileRevalidate => CacheHitDecision::ServeAndRevalidate,
        Strategy::CacheFirst | Strategy::NetworkFirst => CacheHitDecision::Serve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use url::Url;

    use crate::request::Destination;

    fn url(path: &str) -> Url {
        Url::parse("https://app.example/").unwrap().join(path).unwrap()
    }

    fn status(code: u16) -> ResponseSnapshot {
        ResponseSnapshot::new(code, vec![], "")
    }

    #[test]
    fn test_success_is_stored() {
        let req = ProxyRequest::get(url("/app.js"));
        assert_eq!(on_network_response(&req, &status(200)), NetworkDecision::ServeAndStore);
    }

    #[test]
    fn test_non_success_passes_through_unstored() {
        let req = ProxyRequest::get(url("/missing.js"));
        for code in [301, 304, 404, 500, 503] {
            assert_eq!(on_network_response(&req, &status(code)), NetworkDecision::Serve, "status {code}");
        }
    }

    #[test]
    fn test_partial_content_not_stored() {
        let req = ProxyRequest::get(url("/track.mod"));
        assert_eq!(on_network_response(&req, &status(206)), NetworkDecision::Serve);
    }

    #[test]
    fn test_non_get_not_stored() {
        let req = ProxyRequest::new(Method::POST, url("/api"), Destination::SubResource);
        assert_eq!(on_network_response(&req, &status(200)), NetworkDecision::Serve);
    }

    #[test]
    fn test_failure_chain() {
        let asset = ProxyRequest::get(url("/app.js"));
        let page = ProxyRequest::navigate(url("/player.html"));

        assert_eq!(on_network_failure(&asset, true), FailureDecision::ServeCached);
        assert_eq!(on_network_failure(&page, true), FailureDecision::ServeCached);
        assert_eq!(on_network_failure(&page, false), FailureDecision::TryRootDocument);
        assert_eq!(on_network_failure(&asset, false), FailureDecision::Synthesize);
    }

    #[test]
    fn test_strategies() {
        assert!(!consults_cache_first(Strategy::NetworkFirst));
        assert!(consults_cache_first(Strategy::CacheFirst));
        assert!(consults_cache_first(Strategy::StaleWhileRevalidate));
        assert_eq!(on_cache_hit(Strategy::CacheFirst), CacheHitDecision::Serve);
        assert_eq!(on_cache_hit(Strategy::StaleWhileRevalidate), CacheHitDecision::ServeAndRevalidate);
    }

    #[test]
    fn test_resolution_fallback() {
        assert!(!Resolution::Network.is_fallback());
        assert!(!Resolution::Cache.is_fallback());
        assert!(Resolution::RootDocument.is_fallback());
        assert!(Resolution::Offline.is_fallback());
        assert_eq!(Resolution::RootDocument.as_str(), "root-document");
    }
}
