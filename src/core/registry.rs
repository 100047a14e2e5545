//! Service registry: named services built once from validated configuration.
//!
//! Construction is fail-fast. A configuration that reaches steady state has
//! passed duplicate-name, non-empty-pool, URL and auth-reference checks, so
//! the registry itself is immutable afterwards; only the balancers inside it
//! mutate under load.
use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

use crate::{
    config::models::{GatewayConfig, ServiceConfig},
    core::{backend::Backend, balancer::Balancer},
};

/// Errors raised while building the registry from configuration. All of them
/// are fatal at startup.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("duplicate service name: {0}")]
    DuplicateService(String),

    #[error("service {0} has no URLs")]
    NoBackends(String),

    #[error("service {service}: {source}")]
    InvalidBackend {
        service: String,
        #[source]
        source: crate::core::backend::BackendError,
    },

    #[error("no service with name {auth}, which {service} requires for auth")]
    DanglingAuthReference { service: String, auth: String },
}

/// The (auth-service-name, check-path) pair a service is gated behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequirement {
    pub service: String,
    pub path: String,
}

/// One routable unit: a backend pool plus an optional auth requirement.
#[derive(Debug)]
pub struct Service {
    balancer: Arc<Balancer>,
    auth: Option<AuthRequirement>,
}

impl Service {
    /// Build a service from its descriptor, creating one live backend per URL.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RegistryError> {
        if config.urls.is_empty() {
            return Err(RegistryError::NoBackends(config.service.clone()));
        }

        let balancer = Arc::new(Balancer::new());
        for url in &config.urls {
            let backend = Backend::new(url).map_err(|source| RegistryError::InvalidBackend {
                service: config.service.clone(),
                source,
            })?;
            balancer.add_backend(Arc::new(backend));
        }

        Ok(Self {
            balancer,
            auth: config.require_auth.as_ref().map(|auth| AuthRequirement {
                service: auth.name.clone(),
                path: auth.path.clone(),
            }),
        })
    }

    pub fn balancer(&self) -> &Arc<Balancer> {
        &self.balancer
    }

    pub fn auth(&self) -> Option<&AuthRequirement> {
        self.auth.as_ref()
    }
}

/// Named collection of services, immutable after construction.
#[derive(Debug)]
pub struct Registry {
    services: HashMap<String, Arc<Service>>,
}

impl Registry {
    /// Build and cross-validate all services from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RegistryError> {
        let mut services = HashMap::with_capacity(config.services.len());

        for service_config in &config.services {
            if services.contains_key(&service_config.service) {
                return Err(RegistryError::DuplicateService(
                    service_config.service.clone(),
                ));
            }

            let service = Service::from_config(service_config)?;
            services.insert(service_config.service.clone(), Arc::new(service));
        }

        // Referential integrity: every auth requirement names a known service.
        for (name, service) in &services {
            if let Some(auth) = service.auth() {
                if !services.contains_key(&auth.service) {
                    return Err(RegistryError::DanglingAuthReference {
                        service: name.clone(),
                        auth: auth.service.clone(),
                    });
                }
            }
        }

        Ok(Self { services })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Service>> {
        self.services.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<Service>)> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
