// Integration tests for delegated bearer-token authentication with real backends
#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use axum::{Json, Router, body::Body, routing::any};
    use hyper::{Request, StatusCode, header};
    use portico::{
        adapters::{HttpClientAdapter, build_router},
        config::models::{AuthCheckConfig, GatewayConfig, ServiceConfig},
        core::Registry,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    const VALID_TOKEN: &str = "111";

    #[derive(Deserialize)]
    struct TokenPayload {
        token: String,
    }

    /// Spawn an authorizer that accepts only [`VALID_TOKEN`].
    async fn spawn_auth_backend() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new().route(
            "/check",
            any(|Json(payload): Json<TokenPayload>| async move {
                if payload.token == VALID_TOKEN {
                    StatusCode::OK
                } else {
                    StatusCode::UNAUTHORIZED
                }
            }),
        );

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, handle)
    }

    /// Spawn an origin backend that counts the requests it serves.
    async fn spawn_origin_backend(
        calls: Arc<AtomicUsize>,
    ) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new().route(
            "/{*path}",
            any(move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "hello from users"
                }
            }),
        );

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, handle)
    }

    fn gateway_registry(origin: SocketAddr, auth_backends: &[SocketAddr]) -> Arc<Registry> {
        let config = GatewayConfig {
            services: vec![
                ServiceConfig {
                    service: "users".to_string(),
                    urls: vec![format!("http://{origin}")],
                    require_auth: Some(AuthCheckConfig {
                        name: "auth".to_string(),
                        path: "/check".to_string(),
                    }),
                },
                ServiceConfig {
                    service: "auth".to_string(),
                    urls: auth_backends
                        .iter()
                        .map(|addr| format!("http://{addr}"))
                        .collect(),
                    require_auth: None,
                },
            ],
            ..GatewayConfig::default()
        };
        Arc::new(Registry::from_config(&config).expect("test registry"))
    }

    async fn hit(router: &Router, path: &str, bearer: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_valid_token_is_forwarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (origin, _h1) = spawn_origin_backend(Arc::clone(&calls)).await;
        let (auth, _h2) = spawn_auth_backend().await;

        let registry = gateway_registry(origin, &[auth]);
        let router = build_router(&registry, Arc::new(HttpClientAdapter::new())).unwrap();

        assert_eq!(hit(&router, "/users", Some(VALID_TOKEN)).await, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_token_is_rejected_before_forwarding() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (origin, _h1) = spawn_origin_backend(Arc::clone(&calls)).await;
        let (auth, _h2) = spawn_auth_backend().await;

        let registry = gateway_registry(origin, &[auth]);
        let router = build_router(&registry, Arc::new(HttpClientAdapter::new())).unwrap();

        assert_eq!(hit(&router, "/users", None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_token_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (origin, _h1) = spawn_origin_backend(Arc::clone(&calls)).await;
        let (auth, _h2) = spawn_auth_backend().await;

        let registry = gateway_registry(origin, &[auth]);
        let router = build_router(&registry, Arc::new(HttpClientAdapter::new())).unwrap();

        assert_eq!(hit(&router, "/users", Some("222")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_auth_check_fails_over_to_healthy_authorizer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (origin, _h1) = spawn_origin_backend(Arc::clone(&calls)).await;

        // One dead authorizer (bound then closed) and one healthy one.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);
        let (auth, _h2) = spawn_auth_backend().await;

        let registry = gateway_registry(origin, &[dead, auth]);
        let router = build_router(&registry, Arc::new(HttpClientAdapter::new())).unwrap();

        // Every request authorizes even when the dead authorizer is tried
        // first, and the dead one ends up evicted from the auth pool.
        for _ in 0..4 {
            assert_eq!(hit(&router, "/users", Some(VALID_TOKEN)).await, StatusCode::OK);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(registry.get("auth").unwrap().balancer().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_auth_service_rejects_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (origin, _h1) = spawn_origin_backend(Arc::clone(&calls)).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let registry = gateway_registry(origin, &[dead]);
        let router = build_router(&registry, Arc::new(HttpClientAdapter::new())).unwrap();

        assert_eq!(
            hit(&router, "/users", Some(VALID_TOKEN)).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
