//! Portico - a lightweight HTTP gateway with delegated authentication.
//!
//! Portico routes incoming requests to named backend pools, balances load
//! round-robin across each pool, gates protected services behind a delegated
//! bearer-token authorizer, and evicts backends that stop responding - both
//! reactively on the request path and proactively via a background TCP prober.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use portico::{
//!     adapters::{HttpClientAdapter, build_router},
//!     config::load_config,
//!     core::Registry,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = load_config("config.yaml")?;
//! let registry = Arc::new(Registry::from_config(&config)?);
//! let router = build_router(&registry, Arc::new(HttpClientAdapter::new()))?;
//! // Hand `router` to axum::serve (see the binary crate for the full wiring).
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping business logic inside `core`. End users should prefer the
//! re-exports documented below instead of reaching into internal modules
//! directly.
//!
//! # Error Handling
//! All fallible APIs return `eyre::Result<T>` or a domain specific error type.

pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

// These modules are implementation details and should not be directly used by users
pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HealthChecker, HttpClientAdapter, TcpProbeAdapter, build_router},
    core::{Balancer, Gateway, Registry},
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
