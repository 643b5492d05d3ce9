//! Namespace lifecycle: open, enumerate, delete.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio_rusqlite::params;

/// Handle to a cache namespace.
///
/// Obtained from `open`, which guarantees the namespace exists at that
/// moment. A handle built with `named` may refer to a namespace that was
/// never opened; lookups through it simply find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
}

impl Namespace {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Summary of one stored namespace.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NamespaceInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open (creating if needed) a namespace.
    pub async fn open_namespace(&self, name: &str) -> Result<Namespace, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("namespace name cannot be empty".into()));
        }
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Namespace::named(name))
    }

    /// Names of every stored namespace.
    pub async fn list_namespaces(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = BTreeSet::new();
                for name in rows {
                    names.insert(name?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a namespace and all of its entries.
    ///
    /// Returns whether the namespace existed. Deleting an unknown
    /// namespace is not an error.
    pub async fn delete_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE namespace = ?1", params![name])?;
                let removed = tx.execute("DELETE FROM namespaces WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every namespace with its entry count, oldest first.
    pub async fn namespace_summaries(&self) -> Result<Vec<NamespaceInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<NamespaceInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT n.name, n.created_at, COUNT(e.key_hash)
                FROM namespaces n LEFT JOIN entries e ON e.namespace = n.name
                GROUP BY n.name, n.created_at
                ORDER BY n.created_at ASC, n.name ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(NamespaceInfo {
                        name: row.get(0)?,
                        created_at: row.get(1)?,
                        entries: row.get::<_, i64>(2)? as u64,
                    })
                })?;
                let mut infos = Vec::new();
                for info in rows {
                    infos.push(info?);
                }
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{RequestKey, ResponseSnapshot};

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = db.open_namespace("v1").await.unwrap();
        let b = db.open_namespace("v1").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(db.list_namespaces().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.open_namespace("").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for v in ["v1", "v2", "v3"] {
            db.open_namespace(v).await.unwrap();
        }

        assert!(db.delete_namespace("v1").await.unwrap());
        assert!(!db.delete_namespace("v1").await.unwrap());

        let names: Vec<String> = db.list_namespaces().await.unwrap().into_iter().collect();
        assert_eq!(names, ["v2", "v3"]);
    }

    #[tokio::test]
    async fn test_delete_removes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ns = db.open_namespace("v1").await.unwrap();
        let key = RequestKey::get("https://app.example/");
        db.put_entry(&ns, &key, &ResponseSnapshot::new(200, vec![], "<html>"))
            .await
            .unwrap();

        db.delete_namespace("v1").await.unwrap();

        assert_eq!(db.entry_count("v1").await.unwrap(), 0);
        assert!(db.get_entry(&ns, &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_namespace_summaries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_namespace("v1").await.unwrap();
        db.open_namespace("v2").await.unwrap();
        for path in ["/", "/app.js"] {
            let key = RequestKey::get(&format!("https://app.example{path}"));
            db.put_entry(&v1, &key, &ResponseSnapshot::new(200, vec![], "x"))
                .await
                .unwrap();
        }

        let summaries = db.namespace_summaries().await.unwrap();
        let v1_info = summaries.iter().find(|i| i.name == "v1").unwrap();
        let v2_info = summaries.iter().find(|i| i.name == "v2").unwrap();
        assert_eq!(v1_info.entries, 2);
        assert_eq!(v2_info.entries, 0);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        let key = RequestKey::get("https://app.example/app.js");

        {
            let db = CacheDb::open(&path).await.unwrap();
            let ns = db.open_namespace("v1").await.unwrap();
            db.put_entry(&ns, &key, &ResponseSnapshot::new(200, vec![], "persisted"))
                .await
                .unwrap();
            db.conn.close().await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        assert!(db.list_namespaces().await.unwrap().contains("v1"));
        let entry = db.get_entry(&Namespace::named("v1"), &key).await.unwrap().unwrap();
        assert_eq!(&entry.body[..], b"persisted");
    }
}
