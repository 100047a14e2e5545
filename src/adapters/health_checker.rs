use std::{sync::Arc, time::Duration};

use eyre::Result;
use tokio::time::sleep;

use crate::{
    config::models::HealthCheckConfig,
    core::registry::Registry,
    ports::probe::ConnectivityProbe,
    utils::graceful_shutdown::ShutdownToken,
};

/// Background liveness prober.
///
/// On a fixed period it probes every backend of every service and evicts the
/// unreachable ones through the same CAS-plus-remove funnel as the request
/// path, so racing with a concurrent failover eviction is harmless. Evicted
/// backends are never re-admitted; recovery requires a restart or a
/// reconfiguration.
pub struct HealthChecker {
    registry: Arc<Registry>,
    probe: Arc<dyn ConnectivityProbe>,
    config: HealthCheckConfig,
    shutdown: ShutdownToken,
}

impl HealthChecker {
    pub fn new(
        registry: Arc<Registry>,
        probe: Arc<dyn ConnectivityProbe>,
        config: HealthCheckConfig,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            registry,
            probe,
            config,
            shutdown,
        }
    }

    /// Run the health checker loop until the shutdown token fires.
    pub async fn run(mut self) -> Result<()> {
        if !self.config.enabled {
            tracing::info!("Health checking is disabled");
            return Ok(());
        }

        let interval = Duration::from_secs(self.config.interval_secs);

        tracing::info!(
            "Starting health checker with interval: {}s, probe timeout: {}s",
            self.config.interval_secs,
            self.config.timeout_secs
        );

        loop {
            tokio::select! {
                _ = self.shutdown.wait_for_shutdown() => {
                    tracing::info!("Health checker received shutdown signal, exiting");
                    return Ok(());
                }
                _ = sleep(interval) => {}
            }

            self.sweep().await;
        }
    }

    /// Probe every backend of every service once, evicting unreachable ones.
    ///
    /// The pool is snapshotted per service instead of holding the pool lock
    /// across probe I/O; a backend added or removed mid-sweep is simply
    /// picked up on the next sweep.
    pub async fn sweep(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        for (name, service) in self.registry.iter() {
            for backend in service.balancer().snapshot() {
                if self.probe.is_reachable(backend.url(), timeout).await {
                    continue;
                }

                // Only the winner of the liveness CAS removes; a concurrent
                // failover eviction of the same backend makes this a no-op.
                if backend.mark_dead() {
                    tracing::warn!(
                        service = %name,
                        backend = %backend,
                        "backend unreachable, evicting from pool"
                    );
                    service.balancer().remove_backend(&backend);
                }
            }
        }

        tracing::debug!("Health check sweep completed");
    }
}
