use std::time::Duration;

use async_trait::async_trait;
use url::Url;

/// ConnectivityProbe defines the port (interface) for backend liveness probes.
///
/// A probe answers one question: is anything listening at this backend's
/// transport address right now? It carries no HTTP semantics, so the health
/// checker can be exercised in tests with a canned implementation.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + 'static {
    /// Check whether the backend at `url` is reachable within `timeout`.
    async fn is_reachable(&self, url: &Url, timeout: Duration) -> bool;
}
