use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::Master;

impl Master {
    pub(super) fn log_startup(&self, listener: &TcpListener) {
        info!(target: "stash::master", "Starting STASH MASTER");
        info!(
            target: "stash::master",
            listen = ?listener.local_addr().ok(),
            upstream = %self.proxy.settings().upstream,
            cache_timeout_secs = self.cfg.proxy().cache_timeout().as_secs(),
            worker_connections = self.cfg.global().worker_connections(),
            log_level = %self.cfg.global().log_level(),
            "Configuration loaded"
        );
    }

    pub(super) fn init_semaphore(&self) -> Arc<Semaphore> {
        let max_conns = usize::from(self.cfg.global().worker_connections());
        let semaphore = Arc::new(Semaphore::new(max_conns));
        info!(
            target: "stash::master",
            max_conns,
            "Global connection semaphore initialized"
        );
        semaphore
    }

    /// Periodically drops entries far past their freshness window.
    pub(super) fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        if !self.cfg.cache().sweeper_enabled() {
            info!(target: "stash::master", "Cache sweeper disabled");
            return None;
        }

        let period = Duration::from_secs(self.cfg.cache().sweep_interval_secs());
        let cache = self.proxy.cache().clone();
        info!(
            target: "stash::master",
            interval_secs = period.as_secs(),
            horizon_secs = cache.policy().sweep_horizon().as_secs(),
            "Cache sweeper started"
        );

        Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                debug!(
                    target: "stash::master",
                    removed,
                    remaining = cache.len(),
                    "Cache sweep finished"
                );
            }
        }))
    }
}
