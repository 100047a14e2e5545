use std::sync::Arc;

use axum::{Router, extract::Request, routing::any};
use eyre::{Result, eyre};
use tower_http::trace::TraceLayer;

use crate::{
    core::{gateway::Gateway, registry::Registry},
    ports::http_client::HttpClient,
};

/// Build the external axum router: one exact-match route per service name,
/// each bound to its own [`Gateway`].
///
/// A service named `users` is served at the literal path `/users` (names that
/// already start with `/` are used verbatim). There is no prefix or wildcard
/// routing.
pub fn build_router(registry: &Arc<Registry>, client: Arc<dyn HttpClient>) -> Result<Router> {
    let mut router = Router::new();

    for (name, service) in registry.iter() {
        // The registry is validated at construction, so the auth reference
        // resolves; a miss here means the registry invariant was broken.
        let auth_service = match service.auth() {
            Some(auth) => Some(Arc::clone(registry.get(&auth.service).ok_or_else(|| {
                eyre!("auth service '{}' missing for service '{name}'", auth.service)
            })?)),
            None => None,
        };

        let gateway = Arc::new(Gateway::new(
            Arc::clone(service),
            auth_service,
            Arc::clone(&client),
        ));

        let route_path = if name.starts_with('/') {
            name.clone()
        } else {
            format!("/{name}")
        };

        tracing::info!(service = %name, path = %route_path, "binding service route");

        router = router.route(
            &route_path,
            any(move |req: Request| {
                let gateway = Arc::clone(&gateway);
                async move { gateway.handle(req).await }
            }),
        );
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}
