//! Backend selection and request forwarding.

use crate::error::{RouterError, RouterResult};
use crate::hash::fnv1a;
use crate::health::HealthCache;
use tracing::debug;

/// A fixed, ordered pool of backend addresses.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Vec<String>,
}

impl BackendPool {
    /// Creates a pool from an ordered list of addresses.
    #[must_use]
    pub fn new(backends: Vec<String>) -> Self {
        Self { backends }
    }

    /// The backend addresses in pool order.
    #[must_use]
    pub fn backends(&self) -> &[String] {
        &self.backends
    }

    /// Number of backends in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Delegation seam for the actual request forwarding.
///
/// Implementations clone the incoming request onto the selected backend
/// and relay the response; tests record the chosen backend instead.
pub trait Forwarder {
    /// Response type produced by a successful forward.
    type Response;

    /// Forwards the request for `path` to `backend`.
    fn forward(&self, backend: &str, path: &str) -> Result<Self::Response, String>;
}

/// Routes each request path to a healthy backend.
///
/// The home backend is `fnv1a(path) mod pool size`; when it is unhealthy
/// the router probes forward through the pool and takes the first healthy
/// one. Requests for the same path therefore stick to the same backend as
/// long as the pool's health is stable.
pub struct Router {
    pool: BackendPool,
    health: HealthCache,
}

impl Router {
    /// Creates a router over a pool and a health cache.
    #[must_use]
    pub fn new(pool: BackendPool, health: HealthCache) -> Self {
        Self { pool, health }
    }

    /// The pool this router selects from.
    #[must_use]
    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    /// Selects the backend for `path`.
    pub fn select_backend(&self, path: &str) -> RouterResult<&str> {
        if self.pool.is_empty() {
            return Err(RouterError::NoHealthyBackends);
        }

        let start = fnv1a(path.as_bytes()) as usize % self.pool.len();
        for probe in 0..self.pool.len() {
            let backend = &self.pool.backends()[(start + probe) % self.pool.len()];
            if self.health.is_healthy(backend) {
                debug!(path, %backend, probe, "selected backend");
                return Ok(backend);
            }
        }

        Err(RouterError::NoHealthyBackends)
    }

    /// Selects a backend for `path` and forwards the request to it.
    pub fn forward<F: Forwarder>(&self, path: &str, forwarder: &F) -> RouterResult<F::Response> {
        let backend = self.select_backend(path)?;
        forwarder
            .forward(backend, path)
            .map_err(|message| RouterError::Forward {
                backend: backend.to_string(),
                message,
            })
    }
}
