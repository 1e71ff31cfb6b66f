use std::sync::Arc;

use anyhow::Context;
use stash_config::StashConfig;
use stash_proxy::{Proxy, ProxySettings};
use tokio::net::TcpListener;
use tracing::{instrument, warn};

mod accept;
mod startup;

use accept::{accept_loop, bind_listener};

/// Owns the listening socket and everything shared between connections.
pub struct Master {
    cfg: Arc<StashConfig>,
    proxy: Arc<Proxy>,
}

impl Master {
    pub fn new(cfg: StashConfig) -> anyhow::Result<Self> {
        let settings = ProxySettings::from_config(&cfg)
            .with_context(|| format!("invalid upstream '{}'", cfg.proxy().upstream()))?;
        let proxy = Arc::new(Proxy::new(settings));
        Ok(Self::from_parts(cfg, proxy))
    }

    pub fn from_parts(cfg: StashConfig, proxy: Arc<Proxy>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            proxy,
        }
    }

    pub fn proxy(&self) -> &Arc<Proxy> {
        &self.proxy
    }

    /// Binds `proxy.listen` and serves until the accept loop fails.
    #[instrument(skip(self), fields(
        listen = %self.cfg.proxy().listen(),
        worker_connections = %self.cfg.global().worker_connections(),
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = bind_listener(self.cfg.proxy().listen()).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        self.log_startup(&listener);

        let semaphore = self.init_semaphore();
        let sweeper = self.start_sweeper();
        let listen_addr = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| self.cfg.proxy().listen().to_string());

        let result = accept_loop(listener, listen_addr, semaphore, self.proxy.clone()).await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        if let Err(e) = &result {
            warn!(target: "stash::master", error = ?e, "accept_loop exited with an error");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use stash_cache::{CacheKey, CapturedResponse};
    use stash_config::StashConfig;
    use stash_proxy::{Proxy, ProxySettings};

    use super::Master;

    fn master_with_sweeper(interval_secs: u64) -> Master {
        let mut cfg = StashConfig::default();
        cfg.cache.sweep_interval_secs = interval_secs;
        let mut settings =
            ProxySettings::new("127.0.0.1:9".parse().unwrap(), Duration::from_secs(1));
        settings.sweep_after = 1;
        Master::from_parts(cfg, Arc::new(Proxy::new(settings)))
    }

    fn seed(master: &Master) {
        let key = CacheKey::fingerprint(
            &http::Method::GET,
            &"/seed".parse().unwrap(),
            &HeaderMap::new(),
            b"",
        );
        master.proxy().cache().insert(
            key,
            CapturedResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::new()),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_expired_entries() {
        let master = master_with_sweeper(1);
        seed(&master);

        let handle = master.start_sweeper().unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(master.proxy().cache().is_empty());
        assert_eq!(master.proxy().cache().stats().swept, 1);
        handle.abort();
    }

    #[tokio::test]
    async fn disabled_sweeper_is_not_spawned() {
        let master = master_with_sweeper(0);
        seed(&master);

        assert!(master.start_sweeper().is_none());
        assert_eq!(master.proxy().cache().len(), 1);
    }

    #[test]
    fn new_rejects_an_unparsable_upstream() {
        let mut cfg = StashConfig::default();
        cfg.proxy.upstream = "bad host:80".into();
        assert!(Master::new(cfg).is_err());
    }
}
