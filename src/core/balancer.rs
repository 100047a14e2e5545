//! Concurrency-safe backend pool with round-robin selection.
//!
//! The pool keeps a vector of backends plus an id-to-position map so removal
//! is O(1) (swap with the last element). The round-robin cursor is a lone
//! atomic that increments outside the lock; concurrent `get_back` calls only
//! serialize on the brief read-lock needed to inspect the vector.
use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use thiserror::Error;

use crate::core::backend::Backend;

/// Bound on dead-slot skips per selection. Trades strict fairness for a
/// termination guarantee when most of the pool is dead.
const MAX_SELECT_ATTEMPTS: usize = 1000;

/// Errors returned by backend selection
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BalancerError {
    /// The pool is empty or no alive backend was found within the attempt budget
    #[error("no backends available")]
    ServiceUnavailable,
}

#[derive(Debug)]
struct Pool {
    backends: Vec<Arc<Backend>>,
    // Invariant: index[backends[i].id()] == i for every valid i.
    index: HashMap<u64, usize>,
}

/// Round-robin pool of backends for one service.
#[derive(Debug)]
pub struct Balancer {
    inner: RwLock<Pool>,
    cursor: AtomicUsize,
}

impl Balancer {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Pool {
                backends: Vec::new(),
                index: HashMap::new(),
            }),
            cursor: AtomicUsize::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Pool> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Pool> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Select the next alive backend in round-robin order.
    ///
    /// Fairness is best-effort: the cursor is taken modulo the pool's current
    /// length, so a concurrent add or remove can skip or double-visit a slot
    /// for one rotation. An empty pool fails immediately; a pool where no
    /// alive backend turns up within the attempt budget fails with
    /// [`BalancerError::ServiceUnavailable`] instead of spinning forever.
    pub fn get_back(&self) -> Result<Arc<Backend>, BalancerError> {
        for _ in 0..MAX_SELECT_ATTEMPTS {
            let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);

            let pool = self.read();
            if pool.backends.is_empty() {
                return Err(BalancerError::ServiceUnavailable);
            }

            let backend = &pool.backends[cursor % pool.backends.len()];
            if backend.is_alive() {
                return Ok(Arc::clone(backend));
            }
        }

        Err(BalancerError::ServiceUnavailable)
    }

    /// Append a backend to the pool. Backends that are already dead at call
    /// time are silently ignored.
    pub fn add_backend(&self, backend: Arc<Backend>) {
        if !backend.is_alive() {
            return;
        }

        let mut pool = self.write();
        let slot = pool.backends.len();
        pool.index.insert(backend.id(), slot);
        pool.backends.push(backend);
    }

    /// Remove a backend from the pool. Idempotent: the request-path failover
    /// and the health checker may race to remove the same backend, and the
    /// loser must be a no-op.
    pub fn remove_backend(&self, backend: &Backend) {
        let mut pool = self.write();

        let Some(i) = pool.index.remove(&backend.id()) else {
            return;
        };

        pool.backends.swap_remove(i);
        if i < pool.backends.len() {
            let moved_id = pool.backends[i].id();
            pool.index.insert(moved_id, i);
        }
    }

    /// Clone of the current backend list, for out-of-band sweeps that must
    /// not hold the pool lock across I/O.
    pub fn snapshot(&self) -> Vec<Arc<Backend>> {
        self.read().backends.clone()
    }

    /// Number of backends currently in the pool, dead or alive.
    pub fn len(&self) -> usize {
        self.read().backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().backends.is_empty()
    }
}

impl Default for Balancer {
    fn default() -> Self {
        Self::new()
    }
}
