use std::time::Duration;

use serde::Deserialize;

/// Path answered by the built-in health check.
pub const DEFAULT_HEALTH_PATH: &str = "/_stash/health";
/// Path answered by the cache statistics endpoint.
pub const DEFAULT_STATS_PATH: &str = "/_stash/cache";

// =======================================================
// PROXY CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Address the proxy binds for inbound connections.
    pub listen: String,
    /// Upstream `host:port` that uncached or stale requests are sent to.
    pub upstream: String,

    // Timeouts (seconds)
    pub cache_timeout_secs: u64,
    pub upstream_timeout_secs: u64,

    // Limits (bytes)
    pub max_request_body_bytes: u64,
    pub max_upstream_response_body_bytes: u64,

    // Built-in endpoints
    pub health_path: String,
    pub stats_path: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8081".into(),
            upstream: "localhost:8080".into(),
            cache_timeout_secs: 10,
            upstream_timeout_secs: 30,
            max_request_body_bytes: 10 * 1024 * 1024,
            max_upstream_response_body_bytes: 10 * 1024 * 1024,
            health_path: DEFAULT_HEALTH_PATH.into(),
            stats_path: DEFAULT_STATS_PATH.into(),
        }
    }
}

impl ProxyConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Upstream address without an `http://` prefix or trailing slash.
    pub fn upstream_authority(&self) -> &str {
        let trimmed = self.upstream.trim();
        let without_scheme = trimmed.strip_prefix("http://").unwrap_or(trimmed);
        without_scheme.trim_end_matches('/')
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn max_request_body_bytes(&self) -> u64 {
        self.max_request_body_bytes
    }

    pub fn max_upstream_response_body_bytes(&self) -> u64 {
        self.max_upstream_response_body_bytes
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    pub fn stats_path(&self) -> &str {
        &self.stats_path
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &ProxyConfig) {
        if self.listen.trim().is_empty() {
            self.listen = defaults.listen.clone();
        }
        if self.upstream.trim().is_empty() {
            self.upstream = defaults.upstream.clone();
        }
        if self.cache_timeout_secs == 0 {
            self.cache_timeout_secs = defaults.cache_timeout_secs;
        }
        if self.upstream_timeout_secs == 0 {
            self.upstream_timeout_secs = defaults.upstream_timeout_secs;
        }
        if self.max_request_body_bytes == 0 {
            self.max_request_body_bytes = defaults.max_request_body_bytes;
        }
        if self.max_upstream_response_body_bytes == 0 {
            self.max_upstream_response_body_bytes = defaults.max_upstream_response_body_bytes;
        }
        if self.health_path.is_empty() {
            self.health_path = defaults.health_path.clone();
        }
        if self.stats_path.is_empty() {
            self.stats_path = defaults.stats_path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProxyConfig;

    #[test]
    fn upstream_authority_strips_scheme_and_slash() {
        let cfg = ProxyConfig {
            upstream: " http://10.0.0.2:8080/ ".into(),
            ..ProxyConfig::default()
        };
        assert_eq!(cfg.upstream_authority(), "10.0.0.2:8080");
    }

    #[test]
    fn apply_defaults_replaces_zero_values() {
        let defaults = ProxyConfig::default();
        let mut cfg = ProxyConfig {
            listen: String::new(),
            cache_timeout_secs: 0,
            max_request_body_bytes: 0,
            health_path: String::new(),
            ..ProxyConfig::default()
        };
        cfg.apply_defaults_from(&defaults);
        assert_eq!(cfg.listen, "0.0.0.0:8081");
        assert_eq!(cfg.cache_timeout_secs, 10);
        assert_eq!(cfg.max_request_body_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.health_path, "/_stash/health");
    }
}
