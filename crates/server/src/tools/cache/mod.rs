//! Cache lifecycle tools.
//!
//! - `cache_install`: populate the current namespace from the manifest
//! - `cache_activate`: evict stale namespaces and take control
//! - `cache_fetch`: run one request through the interceptor
//! - `cache_status`: version, lifecycle state and namespace summaries

pub mod activate;
pub mod fetch;
pub mod install;
pub mod status;

pub use activate::activate_impl;
pub use fetch::{CacheFetchParams, fetch_impl};
pub use install::install_impl;
pub use status::status_impl;
