//! Retry and failover state machine for backend forwarding.
//!
//! Forwarding failures are handled per request: a fixed-backoff retry budget
//! against the chosen backend, then a CAS-guarded eviction and one failover
//! hop to a replacement, which re-enters the same loop. All retry state
//! travels in a request-scoped [`ProxyContext`] value; nothing is global.
use std::{sync::Arc, time::Duration};

use axum::body::Body;
use bytes::Bytes;
use hyper::{Request, Response, Version, header};
use tokio::time::sleep;

use crate::{
    core::{backend::Backend, balancer::Balancer, gateway::GatewayError},
    ports::http_client::HttpClient,
};

/// Transport-failure retries against a single backend before it is declared dead.
const MAX_RETRIES: u32 = 10;

/// Fixed backoff between retries.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Request-scoped forwarding state: the currently targeted backend and how
/// many retries this request has already burned.
///
/// The retry counter deliberately survives a failover hop: once the original
/// backend has exhausted its budget, each replacement gets a single attempt
/// before it is evicted in turn.
#[derive(Clone)]
pub struct ProxyContext {
    pub backend: Arc<Backend>,
    pub retries: u32,
}

impl ProxyContext {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            retries: 0,
        }
    }
}

/// Compose the outbound URI: backend base URL plus the inbound path and query.
fn backend_uri(backend: &Backend, parts: &http::request::Parts) -> String {
    let base = backend.url().as_str().trim_end_matches('/');
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{base}{path_and_query}")
}

/// Rebuild the buffered inbound request against a specific backend.
fn build_backend_request(
    backend: &Backend,
    parts: &http::request::Parts,
    body: &Bytes,
) -> Result<Request<Body>, GatewayError> {
    let uri = backend_uri(backend, parts);

    let mut req = Request::builder()
        .method(parts.method.clone())
        .uri(&uri)
        .version(Version::HTTP_11)
        .body(Body::from(body.clone()))
        .map_err(|e| GatewayError::Internal(format!("failed to build request for {uri}: {e}")))?;

    // Carry the inbound headers over; Host is rewritten by the client
    // adapter to match the backend authority.
    for (name, value) in &parts.headers {
        if name != header::HOST {
            req.headers_mut().append(name.clone(), value.clone());
        }
    }

    Ok(req)
}

/// Forward a buffered request, retrying and failing over per the context.
///
/// The loop terminates when a backend answers, when the pool is exhausted
/// (`ServiceUnavailable`), or when a request cannot even be constructed
/// (`Internal`).
pub async fn forward_with_failover(
    client: &dyn HttpClient,
    balancer: &Balancer,
    mut cx: ProxyContext,
    parts: http::request::Parts,
    body: Bytes,
) -> Result<Response<Body>, GatewayError> {
    loop {
        let req = build_backend_request(&cx.backend, &parts, &body)?;

        match client.send_request(req).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                tracing::warn!(
                    backend = %cx.backend,
                    retries = cx.retries,
                    error = %err,
                    "transport failure forwarding to backend"
                );

                if cx.retries < MAX_RETRIES {
                    sleep(RETRY_BACKOFF).await;
                    cx = ProxyContext {
                        retries: cx.retries + 1,
                        ..cx
                    };
                    continue;
                }

                // Retry budget exhausted: only the caller that wins the
                // liveness CAS removes the backend from the pool.
                if cx.backend.mark_dead() {
                    tracing::warn!(backend = %cx.backend, "evicting backend after failed retries");
                    balancer.remove_backend(&cx.backend);
                }

                let replacement = balancer
                    .get_back()
                    .map_err(|_| GatewayError::ServiceUnavailable)?;

                tracing::info!(
                    from = %cx.backend,
                    to = %replacement,
                    "failing over to replacement backend"
                );

                cx = ProxyContext {
                    backend: replacement,
                    retries: cx.retries,
                };
            }
        }
    }
}
