//! Configuration data structures for Portico.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files. They are
//! intentionally serde-friendly and include defaults so that minimal configs remain concise.
use serde::{Deserialize, Serialize};

/// Default listen address for the gateway.
fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default sweep interval for the health checker, in seconds.
fn default_interval_secs() -> u64 {
    2
}

/// Default connect timeout for a single liveness probe, in seconds.
fn default_timeout_secs() -> u64 {
    2
}

fn default_enabled() -> bool {
    true
}

/// Health check configuration.
///
/// The checker probes every backend of every service with a raw TCP connect
/// on a fixed period and evicts backends that do not answer within the timeout.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Whether the background health checker runs at all
    pub enabled: bool,
    /// Seconds between two probe sweeps
    pub interval_secs: u64,
    /// Connect timeout for a single probe, in seconds
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reference to the service that performs token verification for another service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthCheckConfig {
    /// Name of the configured service that verifies tokens
    pub name: String,
    /// Path to call on the auth service (e.g. "/check")
    pub path: String,
}

/// One routable service: a name, its backend pool, and an optional auth gate.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Unique service name; doubles as the route key on the listener
    pub service: String,
    /// Backend base URLs; must be non-empty
    #[serde(default)]
    pub urls: Vec<String>,
    /// Optional delegated authentication requirement
    #[serde(default, rename = "require-auth")]
    pub require_auth: Option<AuthCheckConfig>,
}

/// Top-level gateway configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the external listener binds to
    pub listen_addr: String,
    /// Background health checking knobs
    pub health_check: HealthCheckConfig,
    /// The routable services
    pub services: Vec<ServiceConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            health_check: HealthCheckConfig::default(),
            services: Vec::new(),
        }
    }
}
