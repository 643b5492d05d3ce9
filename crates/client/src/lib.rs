//! Client side of cacheward.
//!
//! This crate provides the network fetch primitive, the interception
//! policy, and the lifecycle controller that drives a cache store through
//! install, activate and intercept.

pub mod fetch;
pub mod lifecycle;
pub mod policy;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher};
pub use lifecycle::{
    ActivateReport, ControllerConfig, InstallEntry, InstallReport, InterceptOutcome, Interception, LifecycleController,
    LifecycleState,
};
pub use policy::Resolution;
pub use request::{Destination, ProxyRequest};
pub use reqwest::Method;
