//! # segkv router
//!
//! A hash-based front router for a pool of stateless frontends.
//!
//! Each request path hashes to a home backend via 32-bit FNV-1a; when the
//! home backend is unhealthy the router probes forward through the pool.
//! Backend health is polled periodically into a shared [`HealthCache`]
//! rather than checked inline, so routing never blocks on a probe.
//!
//! ```
//! use segkv_router::{BackendPool, HealthCache, Router};
//!
//! let pool = BackendPool::new(vec!["server1:8080".into(), "server2:8080".into()]);
//! let health = HealthCache::new();
//! health.set("server1:8080", true);
//!
//! let router = Router::new(pool, health);
//! assert!(router.select_backend("/api/v1/some-data").is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod hash;
mod health;
mod router;

pub use error::{RouterError, RouterResult};
pub use hash::fnv1a;
pub use health::{HealthCache, HealthPoller, HealthProbe};
pub use router::{BackendPool, Forwarder, Router};
