//! The storage seam used by the lifecycle controller.

use super::connection::CacheDb;
use super::entries::ResponseSnapshot;
use super::hash::RequestKey;
use super::namespaces::{Namespace, NamespaceInfo};
use crate::Error;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Persistent, namespaced request -> response store.
///
/// Implementations must make `put`, `get` and `delete` atomic per key and
/// tolerate concurrent writers to one namespace. `put` stores whatever it
/// is given; deciding what is cacheable belongs to the caller.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn open(&self, namespace: &str) -> Result<Namespace, Error>;

    async fn put(&self, namespace: &Namespace, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    async fn get(&self, namespace: &Namespace, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    async fn list_namespaces(&self) -> Result<BTreeSet<String>, Error>;

    /// Returns whether the namespace existed.
    async fn delete(&self, namespace: &str) -> Result<bool, Error>;

    async fn entry_count(&self, namespace: &str) -> Result<u64, Error>;

    async fn namespaces(&self) -> Result<Vec<NamespaceInfo>, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, namespace: &str) -> Result<Namespace, Error> {
        self.open_namespace(namespace).await
    }

    async fn put(&self, namespace: &Namespace, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        self.put_entry(namespace, key, response).await
    }

    async fn get(&self, namespace: &Namespace, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        self.get_entry(namespace, key).await
    }

    async fn list_namespaces(&self) -> Result<BTreeSet<String>, Error> {
        CacheDb::list_namespaces(self).await
    }

    async fn delete(&self, namespace: &str) -> Result<bool, Error> {
        self.delete_namespace(namespace).await
    }

    async fn entry_count(&self, namespace: &str) -> Result<u64, Error> {
        CacheDb::entry_count(self, namespace).await
    }

    async fn namespaces(&self) -> Result<Vec<NamespaceInfo>, Error> {
        self.namespace_summaries().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_writers_same_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store: Arc<dyn CacheStore> = Arc::new(db);
        let ns = store.open("v1").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let ns = ns.clone();
            handles.push(tokio::spawn(async move {
                let key = RequestKey::get(&format!("https://app.example/asset-{i}.js"));
                store.put(&ns, &key, &ResponseSnapshot::new(200, vec![], format!("asset {i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.entry_count("v1").await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_delete_while_put_in_flight() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store: Arc<dyn CacheStore> = Arc::new(db);
        let ns = store.open("v0").await.unwrap();

        let writer = {
            let store = store.clone();
            let ns = ns.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    let key = RequestKey::get(&format!("https://app.example/{i}"));
                    // Writes after the delete fail; they must not corrupt anything.
                    let _ = store.put(&ns, &key, &ResponseSnapshot::new(200, vec![], "x")).await;
                }
            })
        };
        store.delete("v0").await.unwrap();
        writer.await.unwrap();

        let remaining = store.entry_count("v0").await.unwrap();
        let listed = store.list_namespaces().await.unwrap().contains("v0");
        assert!(listed || remaining == 0);
    }
}
