//! Outbound request model seen by the interceptor.

use cacheward_core::{Error, RequestKey};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

/// What the request is for. Only document requests get the root-document
/// fallback when offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// A full navigable page.
    Document,
    /// Scripts, styles, images, data files, module binaries.
    #[default]
    #[serde(rename = "subresource")]
    SubResource,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::SubResource => "subresource",
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "navigate" => Ok(Destination::Document),
            "subresource" | "" => Ok(Destination::SubResource),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    method: Method,
    url: Url,
    destination: Destination,
    headers: Vec<(String, String)>,
}

impl ProxyRequest {
    /// The fragment is dropped: it never reaches the network and is not
    /// part of the cache identity.
    pub fn new(method: Method, mut url: Url, destination: Destination) -> Self {
        url.set_fragment(None);
        Self { method, url, destination, headers: Vec::new() }
    }

    /// A `GET` for a sub-resource.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, Destination::SubResource)
    }

    /// A `GET` navigation to a document.
    pub fn navigate(url: Url) -> Self {
        Self::new(Method::GET, url, Destination::Document)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Only `GET` responses are ever stored.
    pub fn is_cacheable_method(&self) -> bool {
        self.method == Method::GET
    }

    /// Cache identity: method plus URL including the query string.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }
}
