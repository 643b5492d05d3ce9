//! In-process doubles for the network and the store.

use async_trait::async_trait;
use bytes::Bytes;
use cacheward_core::{CacheDb, CacheStore, Error, Namespace, NamespaceInfo, RequestKey, ResponseSnapshot};
use reqwest::{StatusCode, header};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::fetch::{FetchResponse, Fetcher};
use crate::request::ProxyRequest;

enum Route {
    Respond { status: u16, content_type: &'static str, body: Bytes },
    Unreachable,
}

/// Fetcher answering from a fixed route table keyed by path and query.
/// Unknown paths answer 404.
pub(crate) struct StubFetcher {
    routes: Mutex<HashMap<String, Route>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), offline: AtomicBool::new(false), calls: AtomicUsize::new(0) }
    }

    pub(crate) fn respond(self, path: &str, status: u16, content_type: &'static str, body: &str) -> Self {
        self.set(path, status, content_type, body);
        self
    }

    pub(crate) fn unreachable(self, path: &str) -> Self {
        self.routes.lock().unwrap().insert(path.to_string(), Route::Unreachable);
        self
    }

    pub(crate) fn set(&self, path: &str, status: u16, content_type: &'static str, body: &str) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Route::Respond { status, content_type, body: Bytes::copy_from_slice(body.as_bytes()) },
        );
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &ProxyRequest) -> Result<FetchResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url())));
        }

        let url = request.url();
        let path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let (status, content_type, body) = match self.routes.lock().unwrap().get(&path) {
            Some(Route::Respond { status, content_type, body }) => (*status, *content_type, body.clone()),
            Some(Route::Unreachable) => return Err(Error::Network(format!("{url}: connection reset"))),
            None => (404, "text/plain", Bytes::from_static(b"not found")),
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));

        Ok(FetchResponse {
            url: url.clone(),
            final_url: url.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            bytes: body,
            fetch_ms: 0,
        })
    }
}

/// Store wrapper that injects failures and latency around a real `CacheDb`.
pub(crate) struct FlakyStore {
    pub(crate) inner: CacheDb,
    pub(crate) fail_open: bool,
    pub(crate) fail_get: bool,
    pub(crate) fail_put_containing: Option<&'static str>,
    pub(crate) put_delay: Option<Duration>,
}

impl FlakyStore {
    pub(crate) fn new(inner: CacheDb) -> Self {
        Self { inner, fail_open: false, fail_get: false, fail_put_containing: None, put_delay: None }
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open(&self, namespace: &str) -> Result<Namespace, Error> {
        if self.fail_open {
            return Err(Error::MigrationFailed("storage unavailable".into()));
        }
        self.inner.open_namespace(namespace).await
    }

    async fn put(&self, namespace: &Namespace, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(needle) = self.fail_put_containing
            && key.url().contains(needle)
        {
            return Err(Error::QuotaExceeded(format!("{key}: quota exceeded")));
        }
        self.inner.put_entry(namespace, key, response).await
    }

    async fn get(&self, namespace: &Namespace, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        if self.fail_get {
            return Err(Error::MigrationFailed("storage unavailable".into()));
        }
        self.inner.get_entry(namespace, key).await
    }

    async fn list_namespaces(&self) -> Result<BTreeSet<String>, Error> {
        self.inner.list_namespaces().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.inner.delete_namespace(namespace).await
    }

    async fn entry_count(&self, namespace: &str) -> Result<u64, Error> {
        self.inner.entry_count(namespace).await
    }

    async fn namespaces(&self) -> Result<Vec<NamespaceInfo>, Error> {
        self.inner.namespace_summaries().await
    }
}
