//! Cached response entries.
//!
//! Entries are upserted by `(namespace, key_hash)`, so repeated writes for
//! the same request overwrite rather than accumulate.

use super::connection::CacheDb;
use super::hash::RequestKey;
use super::namespaces::Namespace;
use crate::Error;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response: status, headers in arrival order, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response may be persisted. Partial content is excluded
    /// since it does not represent the whole resource.
    pub fn is_cacheable_status(&self) -> bool {
        self.is_success() && self.status != 206
    }
}

impl CacheDb {
    /// Insert or replace the entry for `key` in `namespace`.
    ///
    /// No status check is made here; callers decide what is cacheable.
    ///
    /// # Errors
    ///
    /// - `Error::QuotaExceeded` if the body exceeds the per-entry limit.
    /// - `Error::Database` if the namespace no longer exists or the write
    ///   fails.
    pub async fn put_entry(
        &self, namespace: &Namespace, key: &RequestKey, response: &ResponseSnapshot,
    ) -> Result<(), Error> {
        if let Some(max) = self.max_entry_bytes
            && response.body.len() > max
        {
            return Err(Error::QuotaExceeded(format!("{} bytes exceeds {}", response.body.len(), max)));
        }

        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let namespace = namespace.name().to_string();
        let key_hash = key.hash();
        let method = key.method().to_string();
        let url = key.url().to_string();
        let status = response.status as i64;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                    namespace, key_hash, method, url, status_code, headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(namespace, key_hash) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status_code = excluded.status_code,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![namespace, key_hash, method, url, status, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `key` in `namespace`.
    ///
    /// Returns None if the namespace or the entry doesn't exist.
    pub async fn get_entry(&self, namespace: &Namespace, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let namespace = namespace.name().to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status_code, headers_json, body
                FROM entries WHERE namespace = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![namespace, key_hash], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                let (status, headers_json, body) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

                Ok(Some(ResponseSnapshot { status, headers, body: Bytes::from(body) }))
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a namespace.
    pub async fn entry_count(&self, namespace: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE namespace = ?1", params![namespace], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Request identities stored in a namespace, ordered by URL.
    pub async fn entry_keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE namespace = ?1 ORDER BY url, method")?;
                let rows = stmt.query_map(params![namespace], |row| {
                    Ok(RequestKey::new(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?))
                })?;
                let mut keys = Vec::new();
                for key in rows {
                    keys.push(key?);
                }
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
