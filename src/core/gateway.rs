//! Per-service request façade: auth delegation, backend selection, forwarding.
//!
//! A `Gateway` binds one service to at most one auth service (resolved at
//! construction, never looked up per request) and is stateless beyond those
//! references, so a single instance serves concurrent requests.
use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version, header};
use http_body_util::BodyExt;
use hyper::{Request, Response};
use serde::Serialize;
use thiserror::Error;

use crate::{
    core::{
        proxy::{ProxyContext, forward_with_failover},
        registry::Service,
    },
    ports::http_client::HttpClient,
};

/// Expected scheme prefix of the Authorization header.
const BEARER_PREFIX: &str = "Bearer ";

/// Bound on auth-backend attempts per delegated check.
const MAX_AUTH_ATTEMPTS: usize = 1000;

/// Request-scoped error taxonomy, compared by kind. Every variant maps to an
/// HTTP status at the gateway boundary with no backend detail in the body.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// Backend pool empty or exhausted
    #[error("no backends available")]
    ServiceUnavailable,

    /// Authorization header absent, malformed, or not a bearer token
    #[error("invalid token")]
    InvalidToken,

    /// Delegated check returned non-200 or the auth pool was exhausted
    #[error("authorization denied")]
    AuthDenied,

    /// Unexpected failure constructing a request or similar
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::InvalidToken | GatewayError::AuthDenied => StatusCode::UNAUTHORIZED,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing response: status line text only, no internal detail.
    pub fn into_response(self) -> Response<Body> {
        let status = self.status();
        let body = status.canonical_reason().unwrap_or("Error");
        Response::builder()
            .status(status)
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::from("Error")))
    }
}

/// Body sent to the auth service for token verification.
#[derive(Serialize)]
struct TokenPayload<'a> {
    token: &'a str,
}

/// Extract the bearer token value from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, GatewayError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GatewayError::InvalidToken)?
        .to_str()
        .map_err(|_| GatewayError::InvalidToken)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GatewayError::InvalidToken)
}

/// Per-service request handler.
pub struct Gateway {
    service: Arc<Service>,
    auth_service: Option<Arc<Service>>,
    client: Arc<dyn HttpClient>,
}

impl Gateway {
    /// Bind a service, its (already resolved) auth service, and a transport.
    pub fn new(
        service: Arc<Service>,
        auth_service: Option<Arc<Service>>,
        client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            service,
            auth_service,
            client,
        }
    }

    /// Handle one inbound request end to end, translating every error to an
    /// HTTP status at this boundary.
    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        match self.handle_inner(req).await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, status = %err.status(), "request failed");
                err.into_response()
            }
        }
    }

    async fn handle_inner(&self, req: Request<Body>) -> Result<Response<Body>, GatewayError> {
        if let Some(auth) = self.service.auth() {
            let token = bearer_token(req.headers())?;
            if !self.verify_token(token, &auth.path).await? {
                return Err(GatewayError::AuthDenied);
            }
        }

        let backend = self
            .service
            .balancer()
            .get_back()
            .map_err(|_| GatewayError::ServiceUnavailable)?;

        // Buffer the body once so retries and failover can replay it.
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| GatewayError::Internal(format!("failed to read request body: {e}")))?
            .to_bytes();

        forward_with_failover(
            self.client.as_ref(),
            self.service.balancer(),
            ProxyContext::new(backend),
            parts,
            body,
        )
        .await
    }

    /// Delegate token verification to the auth service. Only an exact 200
    /// from an auth backend authorizes the request.
    async fn verify_token(&self, token: &str, check_path: &str) -> Result<bool, GatewayError> {
        let payload = serde_json::to_vec(&TokenPayload { token })
            .map_err(|e| GatewayError::Internal(format!("failed to serialize token: {e}")))?;

        let status = self.delegated_status(check_path, Bytes::from(payload)).await?;
        Ok(status == StatusCode::OK)
    }

    /// Ask auth backends until one answers, evicting unreachable ones along
    /// the way. Exhaustion of the auth pool degrades to 503, which the caller
    /// interprets as "not authorized".
    async fn delegated_status(
        &self,
        check_path: &str,
        payload: Bytes,
    ) -> Result<StatusCode, GatewayError> {
        let auth_service = self.auth_service.as_ref().ok_or_else(|| {
            GatewayError::Internal("auth required but no auth service bound".to_string())
        })?;

        for _ in 0..MAX_AUTH_ATTEMPTS {
            let Ok(backend) = auth_service.balancer().get_back() else {
                break;
            };

            let uri = format!(
                "{}{check_path}",
                backend.url().as_str().trim_end_matches('/')
            );

            let req = Request::builder()
                .method(http::Method::GET)
                .uri(&uri)
                .version(Version::HTTP_11)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.clone()));

            let Ok(req) = req else {
                continue;
            };

            match self.client.send_request(req).await {
                Ok(response) => return Ok(response.status()),
                Err(err) => {
                    tracing::warn!(backend = %backend, error = %err, "auth backend unreachable");
                    if backend.mark_dead() {
                        auth_service.balancer().remove_backend(&backend);
                    }
                }
            }
        }

        Ok(StatusCode::SERVICE_UNAVAILABLE)
    }
}
