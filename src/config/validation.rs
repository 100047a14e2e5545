use std::{collections::HashSet, net::SocketAddr};

use eyre::Result;

use crate::config::models::{GatewayConfig, ServiceConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Duplicate service name: {name}")]
    DuplicateService { name: String },

    #[error("Service '{service}' requires auth from unknown service '{auth}'")]
    DanglingAuthReference { service: String, auth: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.services.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "services".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for service in &config.services {
            if !seen.insert(service.service.as_str()) {
                errors.push(ValidationError::DuplicateService {
                    name: service.service.clone(),
                });
            }

            if let Err(mut service_errors) = Self::validate_service(service) {
                errors.append(&mut service_errors);
            }
        }

        // Every require-auth must name another configured service
        for service in &config.services {
            if let Some(auth) = &service.require_auth {
                if !config.services.iter().any(|s| s.service == auth.name) {
                    errors.push(ValidationError::DanglingAuthReference {
                        service: service.service.clone(),
                        auth: auth.name.clone(),
                    });
                }
            }
        }

        if config.health_check.enabled && config.health_check.interval_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "health_check.interval_secs".to_string(),
                message: "Interval must be greater than 0 when health checking is enabled"
                    .to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate a single service descriptor
    fn validate_service(service: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let name = &service.service;

        if name.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "service".to_string(),
            });
        }

        if service.urls.is_empty() {
            errors.push(ValidationError::InvalidField {
                field: format!("service '{name}' urls"),
                message: "Service must have at least one backend URL".to_string(),
            });
        }

        for (i, url) in service.urls.iter().enumerate() {
            if let Err(e) = Self::validate_url(url, &format!("service '{name}' url {}", i + 1)) {
                errors.push(e);
            }
        }

        if let Some(auth) = &service.require_auth {
            if !auth.path.starts_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("service '{name}' require-auth path"),
                    message: "Auth check path must start with '/'".to_string(),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate URL format
    fn validate_url(url_str: &str, context: &str) -> ValidationResult<()> {
        match url::Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: format!(
                            "URL scheme must be 'http' or 'https', got '{}'",
                            url.scheme()
                        ),
                    });
                }

                if url.host().is_none() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "URL must have a valid host".to_string(),
                    });
                }

                Ok(())
            }
            Err(e) => Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("Invalid URL format: {e}"),
            }),
        }
    }

    /// Format multiple validation errors into a single readable message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
