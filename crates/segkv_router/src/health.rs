//! Backend health cache and poller.
//!
//! Routing decisions never probe backends inline: a poller thread per
//! backend refreshes a shared cache on a fixed interval, and selection
//! reads the cached verdicts. A backend with no verdict yet counts as
//! unhealthy.

use crate::router::BackendPool;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Probes a single backend for liveness.
///
/// Implementations perform the actual `GET /health` with a short timeout;
/// tests flip verdicts programmatically.
pub trait HealthProbe: Send + Sync + 'static {
    /// Returns whether the backend at `address` currently reports healthy.
    fn check(&self, address: &str) -> bool;
}

/// Shared `address -> healthy` map.
#[derive(Debug, Clone, Default)]
pub struct HealthCache {
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

impl HealthCache {
    /// Creates an empty cache; every backend starts out unhealthy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a verdict for a backend.
    pub fn set(&self, address: &str, healthy: bool) {
        self.inner.write().insert(address.to_string(), healthy);
    }

    /// Returns the cached verdict, defaulting to unhealthy.
    #[must_use]
    pub fn is_healthy(&self, address: &str) -> bool {
        self.inner.read().get(address).copied().unwrap_or(false)
    }

    /// Copies out the current verdicts.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.inner.read().clone()
    }
}

/// Polling granularity for the stop flag.
const STOP_CHECK_STEP: Duration = Duration::from_millis(50);

/// One polling thread per backend, refreshing a [`HealthCache`].
pub struct HealthPoller {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl HealthPoller {
    /// Spawns a poller thread per backend in the pool.
    ///
    /// Each thread probes immediately, then once per `interval` until
    /// [`HealthPoller::stop`] is called or the poller is dropped.
    pub fn spawn<P: HealthProbe>(
        pool: &BackendPool,
        cache: HealthCache,
        probe: Arc<P>,
        interval: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handles = pool
            .backends()
            .iter()
            .cloned()
            .map(|address| {
                let cache = cache.clone();
                let probe = Arc::clone(&probe);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        let healthy = probe.check(&address);
                        cache.set(&address, healthy);
                        debug!(%address, healthy, "health poll");
                        sleep_until_stopped(interval, &stop);
                    }
                })
            })
            .collect();

        Self { stop, handles }
    }

    /// Stops all polling threads and waits for them to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for HealthPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sleeps for `interval` in short slices so a stop request takes effect
/// promptly.
fn sleep_until_stopped(interval: Duration, stop: &AtomicBool) {
    let mut slept = Duration::ZERO;
    while slept < interval && !stop.load(Ordering::Relaxed) {
        let step = STOP_CHECK_STEP.min(interval - slept);
        std::thread::sleep(step);
        slept += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct ScriptedProbe {
        verdicts: Mutex<HashMap<String, bool>>,
    }

    impl ScriptedProbe {
        fn new() -> Self {
            Self {
                verdicts: Mutex::new(HashMap::new()),
            }
        }

        fn set(&self, address: &str, healthy: bool) {
            self.verdicts.lock().insert(address.to_string(), healthy);
        }
    }

    impl HealthProbe for ScriptedProbe {
        fn check(&self, address: &str) -> bool {
            self.verdicts.lock().get(address).copied().unwrap_or(false)
        }
    }

    #[test]
    fn cache_defaults_to_unhealthy() {
        let cache = HealthCache::new();
        assert!(!cache.is_healthy("server1:8080"));

        cache.set("server1:8080", true);
        assert!(cache.is_healthy("server1:8080"));
    }

    #[test]
    fn poller_populates_cache() {
        let pool = BackendPool::new(vec!["server1:8080".into(), "server2:8080".into()]);
        let cache = HealthCache::new();
        let probe = Arc::new(ScriptedProbe::new());
        probe.set("server1:8080", true);

        let poller = HealthPoller::spawn(
            &pool,
            cache.clone(),
            Arc::clone(&probe),
            Duration::from_millis(10),
        );

        // The first probe happens immediately; give the threads a moment.
        for _ in 0..100 {
            if cache.is_healthy("server1:8080") {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(cache.is_healthy("server1:8080"));
        assert!(!cache.is_healthy("server2:8080"));

        probe.set("server2:8080", true);
        for _ in 0..100 {
            if cache.is_healthy("server2:8080") {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(cache.is_healthy("server2:8080"));

        poller.stop();
    }

    #[test]
    fn stop_joins_threads() {
        let pool = BackendPool::new(vec!["server1:8080".into()]);
        let poller = HealthPoller::spawn(
            &pool,
            HealthCache::new(),
            Arc::new(ScriptedProbe::new()),
            Duration::from_secs(60),
        );

        // Must return promptly despite the long interval.
        poller.stop();
    }
}
