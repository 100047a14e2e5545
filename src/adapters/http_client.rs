use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response, header, header::HeaderValue};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// HTTP client adapter using Hyper (HTTP/1.1 to plain-HTTP backends).
///
/// Responsibilities:
/// * Rewrites the Host header to the backend authority
/// * Converts between Hyper body and Axum body types
/// * Maps connection-level failures to `HttpClientError::ConnectionError`
///
/// Retries and failover are deliberately not handled here; they live in the
/// core so the policy can be tested against a mock transport.
pub struct HttpClientAdapter {
    client: Client<HttpConnector, AxumBody>,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(HttpConnector::new());
        tracing::info!("Created new HTTP client adapter");
        Self { client }
    }
}

impl Default for HttpClientAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        // Set Host header to match the backend authority
        let Some(host_str) = req.uri().host() else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        };

        let host_header_val = if let Some(port) = req.uri().port() {
            HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16()))
        } else {
            HeaderValue::from_str(host_str)
        }
        .map_err(|e| HttpClientError::InvalidRequest(format!("Invalid host header: {e}")))?;
        req.headers_mut().insert(header::HOST, host_header_val);

        let method = req.method().clone();
        let uri = req.uri().clone();

        tracing::debug!(method = %method, uri = %uri, "sending request to backend");

        match self.client.request(req).await {
            Ok(response) => {
                let (mut parts, hyper_body) = response.into_parts();

                // The body is re-framed on the way back out; drop the
                // upstream framing header.
                parts.headers.remove(header::TRANSFER_ENCODING);

                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Err(e) => {
                tracing::debug!(method = %method, uri = %uri, error = %e, "backend request failed");
                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method} {uri} failed: {e}"
                )))
            }
        }
    }
}
