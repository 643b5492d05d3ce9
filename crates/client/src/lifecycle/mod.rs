//! Cache lifecycle controller.
//!
//! Three triggers drive the cache:
//!
//! - **install**: fetch every manifest entry in parallel and store it in the
//!   namespace named after the current version. Per-entry failures are
//!   logged and reported, never fatal.
//! - **activate**: delete every namespace other than the current one, then
//!   take control of all subsequent requests.
//! - **intercept**: answer a same-origin request according to the
//!   configured strategy; cross-origin requests pass through.
//!
//! Cache write-backs after a network response run as background tasks owned
//! by the controller, so a caller dropping its request does not cancel them.

mod report;

use std::sync::Arc;

use cacheward_core::{
    AppConfig, AssetManifest, CacheStore, CacheVersion, Error, Namespace, RequestKey, ResponseSnapshot, Strategy,
};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Fetcher, resolve, same_origin};
use crate::policy::{self, CacheHitDecision, FailureDecision, NetworkDecision, Resolution};
use crate::request::ProxyRequest;

pub use report::{ActivateReport, InstallEntry, InstallReport, InterceptOutcome, Interception, LifecycleState};

/// Deploy-time inputs for one controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub manifest: AssetManifest,
    /// The application's own origin; manifest entries resolve against it.
    pub origin: Url,
    /// Served to navigations when offline and uncached. Expected to be
    /// listed in the manifest.
    pub root_document: String,
    pub strategy: Strategy,
    pub install_concurrency: usize,
}

impl ControllerConfig {
    pub fn new(manifest: AssetManifest, origin: Url) -> Self {
        Self { manifest, origin, root_document: "/".to_string(), strategy: Strategy::default(), install_concurrency: 8 }
    }

    /// Build from validated application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            manifest: config.manifest(),
            origin,
            root_document: config.root_document.clone(),
            strategy: config.strategy,
            install_concurrency: config.install_concurrency,
        })
    }
}

/// Drives a `CacheStore` through install, activate and intercept.
pub struct LifecycleController {
    config: ControllerConfig,
    root_document: Url,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<LifecycleState>,
    refreshes: Mutex<JoinSet<()>>,
}

impl LifecycleController {
    pub fn new(config: ControllerConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let root_document = resolve(&config.origin, &config.root_document)
            .map_err(|e| Error::InvalidUrl(format!("root document {}: {}", config.root_document, e)))?;

        Ok(Self {
            config,
            root_document,
            store,
            fetcher,
            state: RwLock::new(LifecycleState::Parsed),
            refreshes: Mutex::new(JoinSet::new()),
        })
    }

    pub fn version(&self) -> &CacheVersion {
        self.config.manifest.version()
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    pub fn origin(&self) -> &Url {
        &self.config.origin
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// The network primitive, for hosts performing pass-through requests.
    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Populate the current namespace from the manifest.
    ///
    /// Safe to call repeatedly: entries are overwritten by key. Calling it
    /// on an active controller refreshes the cache without giving up
    /// control.
    ///
    /// # Errors
    ///
    /// Fails only when the namespace itself cannot be opened.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let version = self.version().clone();
        let previous = self.begin(LifecycleState::Installing).await;

        tracing::info!(version = %version, assets = self.config.manifest.len(), "installing");

        let namespace = match self.store.open(version.as_str()).await {
            Ok(ns) => ns,
            Err(e) => {
                tracing::error!(version = %version, error = %e, "cannot open cache namespace");
                *self.state.write().await = previous;
                return Err(e);
            }
        };

        let assets = self.config.manifest.assets();
        let mut entries: Vec<InstallEntry> =
            assets.iter().map(|a| InstallEntry::failed(a, None, "install task aborted")).collect();

        let semaphore = Arc::new(Semaphore::new(self.config.install_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for (index, asset) in assets.iter().enumerate() {
            let url = match resolve(&self.config.origin, asset) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(asset = %asset, error = %e, "skipping unresolvable manifest entry");
                    entries[index] = InstallEntry::failed(asset, None, e.to_string());
                    continue;
                }
            };

            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let fetcher = self.fetcher.clone();
            let namespace = namespace.clone();
            let asset = asset.clone();

            join_set.spawn(async move {
                // Held for the task's duration to bound concurrency.
                let _permit = semaphore.acquire_owned().await;
                let entry = cache_asset(store.as_ref(), fetcher.as_ref(), &namespace, &asset, url).await;
                (index, entry)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, entry)) => entries[index] = entry,
                Err(e) => tracing::warn!(error = %e, "install task did not complete"),
            }
        }

        {
            let mut state = self.state.write().await;
            if *state == LifecycleState::Installing {
                *state = LifecycleState::Installed;
            }
        }

        let report = InstallReport {
            version: version.to_string(),
            entries,
            skip_waiting: true,
            installed_at: chrono::Utc::now().to_rfc3339(),
        };

        tracing::info!(
            version = %version,
            cached = report.cached_count(),
            failed = report.entries.len() - report.cached_count(),
            "install complete"
        );

        Ok(report)
    }

    /// Evict every namespace except the current one and claim all clients.
    ///
    /// # Errors
    ///
    /// Fails only when the namespaces cannot be enumerated; individual
    /// delete failures are reported in `retained`.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let version = self.version().clone();
        let previous = self.begin(LifecycleState::Activating).await;

        let names = match self.store.list_namespaces().await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(version = %version, error = %e, "cannot list cache namespaces");
                *self.state.write().await = previous;
                return Err(e);
            }
        };

        let mut evicted = Vec::new();
        let mut retained = Vec::new();

        for name in names {
            if version.is_namespace(&name) {
                continue;
            }
            match self.store.delete(&name).await {
                Ok(_) => {
                    tracing::info!(namespace = %name, "deleted stale cache namespace");
                    evicted.push(name);
                }
                Err(e) => {
                    tracing::warn!(namespace = %name, error = %e, "failed to delete stale cache namespace");
                    retained.push(name);
                }
            }
        }

        *self.state.write().await = LifecycleState::Activated;
        tracing::info!(version = %version, evicted = evicted.len(), "activated; claiming all clients");

        Ok(ActivateReport { version: version.to_string(), evicted, retained, clients_claimed: true })
    }

    /// Answer one outbound request.
    ///
    /// Never fails: a handled request always carries a response, at worst
    /// the synthesized 503.
    pub async fn intercept(&self, request: ProxyRequest) -> InterceptOutcome {
        if !same_origin(request.url(), &self.config.origin) {
            tracing::trace!(url = %request.url(), "cross-origin request, passing through");
            return InterceptOutcome::PassThrough(request);
        }

        if self.state().await != LifecycleState::Activated {
            tracing::debug!(url = %request.url(), "controller not active, passing through");
            return InterceptOutcome::PassThrough(request);
        }

        let (response, resolution) = if policy::consults_cache_first(self.config.strategy) {
            self.cache_then_network(&request).await
        } else {
            self.network_then_cache(&request, false).await
        };

        tracing::debug!(
            url = %request.url(),
            status = response.status,
            resolution = resolution.as_str(),
            "intercepted"
        );

        InterceptOutcome::Handled(Interception { request, response, resolution })
    }

    /// Wait for every background cache write started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.refreshes.lock().await);
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background cache refresh did not complete");
            }
        }
    }

    async fn begin(&self, next: LifecycleState) -> LifecycleState {
        let mut state = self.state.write().await;
        let previous = *state;
        // A re-run on an active controller keeps it in control.
        if previous != LifecycleState::Activated || next == LifecycleState::Activating {
            *state = next;
        }
        previous
    }

    async fn network_then_cache(&self, request: &ProxyRequest, cache_checked: bool) -> (ResponseSnapshot, Resolution) {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if policy::on_network_response(request, &snapshot) == NetworkDecision::ServeAndStore {
                    self.spawn_store(request.key(), snapshot.clone()).await;
                }
                (snapshot, Resolution::Network)
            }
            Err(e) => {
                tracing::debug!(url = %request.url(), error = %e, "network unavailable, falling back");
                self.fall_back(request, cache_checked).await
            }
        }
    }

    async fn cache_then_network(&self, request: &ProxyRequest) -> (ResponseSnapshot, Resolution) {
        if request.is_cacheable_method()
            && let Some(hit) = self.lookup(&request.key()).await
        {
            if policy::on_cache_hit(self.config.strategy) == CacheHitDecision::ServeAndRevalidate {
                self.spawn_revalidate(request.clone()).await;
            }
            return (hit, Resolution::Cache);
        }

        self.network_then_cache(request, true).await
    }

    async fn fall_back(&self, request: &ProxyRequest, cache_checked: bool) -> (ResponseSnapshot, Resolution) {
        let cached = if cache_checked { None } else { self.lookup(&request.key()).await };

        match policy::on_network_failure(request, cached.is_some()) {
            FailureDecision::ServeCached => match cached {
                Some(hit) => (hit, Resolution::Cache),
                None => (policy::offline_response(), Resolution::Offline),
            },
            FailureDecision::TryRootDocument => match self.lookup(&RequestKey::get(self.root_document.as_str())).await {
                Some(root) => (root, Resolution::RootDocument),
                None => (policy::offline_response(), Resolution::Offline),
            },
            FailureDecision::Synthesize => (policy::offline_response(), Resolution::Offline),
        }
    }

    /// Read from the current namespace; storage errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<ResponseSnapshot> {
        let namespace = Namespace::named(self.version().as_str());
        match self.store.get(&namespace, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn spawn_store(&self, key: RequestKey, snapshot: ResponseSnapshot) {
        let store = self.store.clone();
        let version = self.version().clone();
        self.spawn_background(async move {
            store_entry(store.as_ref(), &version, &key, &snapshot).await;
        })
        .await;
    }

    async fn spawn_revalidate(&self, request: ProxyRequest) {
        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        let version = self.version().clone();
        self.spawn_background(async move {
            match fetcher.fetch(&request).await {
                Ok(response) => {
                    let snapshot = response.to_snapshot();
                    if policy::on_network_response(&request, &snapshot) == NetworkDecision::ServeAndStore {
                        store_entry(store.as_ref(), &version, &request.key(), &snapshot).await;
                    }
                }
                Err(e) => tracing::debug!(url = %request.url(), error = %e, "revalidation skipped, network unavailable"),
            }
        })
        .await;
    }

    async fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut refreshes = self.refreshes.lock().await;
        while refreshes.try_join_next().is_some() {}
        refreshes.spawn(task);
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        // Outstanding write-backs finish on the runtime instead of aborting.
        self.refreshes.get_mut().detach_all();
    }
}

async fn cache_asset(
    store: &dyn CacheStore, fetcher: &dyn Fetcher, namespace: &Namespace, asset: &str, url: Url,
) -> InstallEntry {
    let request = ProxyRequest::get(url);
    let url_str = request.url().as_str();

    let response = match fetcher.fetch(&request).await {
        Ok(response) => response.to_snapshot(),
        Err(e) => {
            tracing::warn!(asset = %asset, error = %e, "failed to cache asset");
            return InstallEntry::failed(asset, Some(url_str), e.to_string());
        }
    };

    if !response.is_cacheable_status() {
        let e = Error::NotCacheable(format!("status {}", response.status));
        tracing::warn!(asset = %asset, error = %e, "failed to cache asset");
        return InstallEntry::failed(asset, Some(url_str), e.to_string());
    }

    match store.put(namespace, &request.key(), &response).await {
        Ok(()) => InstallEntry::cached(asset, url_str),
        Err(e) => {
            tracing::warn!(asset = %asset, storage = e.is_storage(), error = %e, "failed to cache asset");
            InstallEntry::failed(asset, Some(url_str), e.to_string())
        }
    }
}

async fn store_entry(store: &dyn CacheStore, version: &CacheVersion, key: &RequestKey, snapshot: &ResponseSnapshot) {
    let result = match store.open(version.as_str()).await {
        Ok(namespace) => store.put(&namespace, key, snapshot).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => tracing::debug!(key = %key, "cache entry refreshed"),
        Err(e) => tracing::warn!(key = %key, storage = e.is_storage(), error = %e, "failed to refresh cache entry"),
    }
}
