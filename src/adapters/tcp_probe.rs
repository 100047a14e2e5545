use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

use crate::ports::probe::ConnectivityProbe;

/// Liveness probe that attempts a raw TCP connect to the backend's host and
/// immediately drops the connection. No request is sent; a completed
/// handshake within the timeout counts as reachable.
pub struct TcpProbeAdapter;

impl TcpProbeAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TcpProbeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbeAdapter {
    async fn is_reachable(&self, url: &Url, timeout: Duration) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let Some(port) = url.port_or_known_default() else {
            return false;
        };

        match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(backend = %url, error = %e, "probe connect failed");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %url, "probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_listening_socket_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("http://{addr}")).unwrap();

        let probe = TcpProbeAdapter::new();
        assert!(probe.is_reachable(&url, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{addr}")).unwrap();

        let probe = TcpProbeAdapter::new();
        assert!(!probe.is_reachable(&url, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_hostless_url_is_unreachable() {
        // file URLs have no host to connect to.
        let url = Url::parse("file:///tmp/socket").unwrap();
        let probe = TcpProbeAdapter::new();
        assert!(!probe.is_reachable(&url, Duration::from_secs(2)).await);
    }
}
