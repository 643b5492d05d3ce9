//! SQLite-backed, namespaced response cache.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - One namespace per deployment version, several coexisting during an upgrade
//! - Request identity keyed by SHA-256 of method and normalized URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::ResponseSnapshot;
pub use hash::RequestKey;
pub use namespaces::{Namespace, NamespaceInfo};
pub use store::CacheStore;
