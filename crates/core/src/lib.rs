//! Core types and shared functionality for cacheward.
//!
//! This crate provides:
//! - Namespaced response cache with SQLite backend
//! - Unified error types
//! - Configuration structures and the asset manifest

pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;

pub use cache::{CacheDb, CacheStore, Namespace, NamespaceInfo, RequestKey, ResponseSnapshot};
pub use config::{AppConfig, ConfigError, Strategy};
pub use error::Error;
pub use manifest::{AssetManifest, CacheVersion};
