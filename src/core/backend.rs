use std::{
    fmt,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use thiserror::Error;
use url::Url;

/// Errors related to backend construction
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// Error when URL is invalid
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

// Process-wide source of backend identities. Identity is what the balancer's
// index map is keyed on, so two backends with the same URL stay distinct.
static NEXT_BACKEND_ID: AtomicU64 = AtomicU64::new(0);

/// One upstream endpoint: an immutable base URL plus a liveness flag.
///
/// The liveness flag transitions true to false at most once per backend
/// lifetime. [`Backend::mark_dead`] has compare-and-swap semantics: of all
/// concurrent callers, exactly one observes the transition and is responsible
/// for removing the backend from its pool.
#[derive(Debug)]
pub struct Backend {
    id: u64,
    url: Url,
    alive: AtomicBool,
}

impl Backend {
    /// Parse a base URL and create a live backend for it.
    pub fn new(raw_url: &str) -> BackendResult<Self> {
        let url = Url::parse(raw_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{raw_url}: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BackendError::InvalidUrl(format!(
                "Backend URL scheme must be 'http' or 'https', got: {raw_url}"
            )));
        }

        if url.host_str().is_none() {
            return Err(BackendError::InvalidUrl(format!(
                "Backend URL must have a host: {raw_url}"
            )));
        }

        Ok(Self {
            id: NEXT_BACKEND_ID.fetch_add(1, Ordering::Relaxed),
            url,
            alive: AtomicBool::new(true),
        })
    }

    /// Stable identity used by the balancer's index map.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The backend's base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the backend is currently considered alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Flip the liveness flag to false.
    ///
    /// Returns true only for the caller that performed the transition; every
    /// other concurrent caller gets false and must not act on the death.
    pub fn mark_dead(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new_valid() {
        let backend = Backend::new("http://localhost:8001").expect("valid URL should parse");
        assert!(backend.is_alive());
        assert_eq!(backend.url().host_str(), Some("localhost"));
        assert_eq!(backend.url().port(), Some(8001));
    }

    #[test]
    fn test_backend_new_invalid() {
        assert!(Backend::new("localhost:8001").is_err());
        assert!(Backend::new("ftp://localhost:8001").is_err());
        assert!(Backend::new("http://").is_err());
    }

    #[test]
    fn test_backend_ids_are_unique() {
        let a = Backend::new("http://localhost:8001").unwrap();
        let b = Backend::new("http://localhost:8001").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_mark_dead_transitions_once() {
        let backend = Backend::new("http://localhost:8001").unwrap();

        assert!(backend.mark_dead(), "first caller wins the transition");
        assert!(!backend.is_alive());
        assert!(!backend.mark_dead(), "second caller must not act");
    }
}
