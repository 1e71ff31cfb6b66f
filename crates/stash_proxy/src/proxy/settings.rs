use std::time::Duration;

use http::uri::{Authority, InvalidUri};
use stash_cache::CachePolicy;
use stash_config::{StashConfig, DEFAULT_HEALTH_PATH, DEFAULT_STATS_PATH};

/// Runtime view of the proxy section of the configuration.
#[derive(Clone, Debug)]
pub struct ProxySettings {
    pub upstream: Authority,
    pub cache_timeout: Duration,
    pub upstream_timeout: Duration,
    pub max_request_body_bytes: u64,
    pub max_upstream_response_body_bytes: u64,
    pub health_path: String,
    pub stats_path: String,
    pub max_entries: usize,
    pub sweep_after: u32,
}

impl ProxySettings {
    pub fn new(upstream: Authority, cache_timeout: Duration) -> Self {
        Self {
            upstream,
            cache_timeout,
            upstream_timeout: Duration::from_secs(30),
            max_request_body_bytes: 10 * 1024 * 1024,
            max_upstream_response_body_bytes: 10 * 1024 * 1024,
            health_path: DEFAULT_HEALTH_PATH.into(),
            stats_path: DEFAULT_STATS_PATH.into(),
            max_entries: 0,
            sweep_after: 4,
        }
    }

    pub fn from_config(cfg: &StashConfig) -> Result<Self, InvalidUri> {
        let proxy = cfg.proxy();
        let upstream = proxy.upstream_authority().parse::<Authority>()?;

        Ok(Self {
            upstream,
            cache_timeout: proxy.cache_timeout(),
            upstream_timeout: proxy.upstream_timeout(),
            max_request_body_bytes: proxy.max_request_body_bytes(),
            max_upstream_response_body_bytes: proxy.max_upstream_response_body_bytes(),
            health_path: proxy.health_path().to_string(),
            stats_path: proxy.stats_path().to_string(),
            max_entries: cfg.cache().max_entries(),
            sweep_after: cfg.cache().sweep_after(),
        })
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new(self.cache_timeout)
            .with_max_entries(self.max_entries)
            .with_sweep_after(self.sweep_after)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use stash_config::StashConfig;

    use super::ProxySettings;

    #[test]
    fn from_config_strips_the_scheme() {
        let mut cfg = StashConfig::default();
        cfg.proxy.upstream = "http://10.0.0.2:8080/".into();
        cfg.cache.max_entries = 64;

        let settings = ProxySettings::from_config(&cfg).unwrap();
        assert_eq!(settings.upstream.as_str(), "10.0.0.2:8080");
        assert_eq!(settings.cache_timeout, Duration::from_secs(10));
        assert_eq!(settings.cache_policy().max_entries(), 64);
        assert_eq!(settings.cache_policy().sweep_horizon(), Duration::from_secs(40));
    }
}
