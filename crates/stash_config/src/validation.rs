use std::net::SocketAddr;

use http::uri::Authority;

use crate::StashConfig;

/// Validation output for a loaded Stash configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the collected error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a Stash configuration and return a report of issues.
pub fn validate(cfg: &StashConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_listen(cfg, &mut report);
    validate_upstream(cfg, &mut report);
    validate_paths(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_listen(cfg: &StashConfig, report: &mut ConfigReport) {
    let listen = cfg.proxy().listen().trim();
    if listen.is_empty() {
        report.error("proxy.listen is empty");
    } else if listen.parse::<SocketAddr>().is_err() {
        report.warn(format!(
            "proxy.listen '{listen}' is not a socket address; DNS resolution will be used"
        ));
    }
}

fn validate_upstream(cfg: &StashConfig, report: &mut ConfigReport) {
    let raw = cfg.proxy().upstream().trim();
    if raw.is_empty() {
        report.error("proxy.upstream is empty");
        return;
    }

    if raw.starts_with("https://") {
        report.error(format!(
            "proxy.upstream '{raw}' uses https; only plain http upstreams are supported"
        ));
        return;
    }

    let authority = cfg.proxy().upstream_authority();
    let parsed = match authority.parse::<Authority>() {
        Ok(parsed) if !authority.contains('/') => parsed,
        _ => {
            report.error(format!(
                "proxy.upstream '{raw}' is not a valid host:port authority"
            ));
            return;
        }
    };

    if parsed.port_u16().is_none() {
        report.warn(format!(
            "proxy.upstream '{raw}' has no port; port 80 will be used"
        ));
    }
}

fn validate_paths(cfg: &StashConfig, report: &mut ConfigReport) {
    let health = cfg.proxy().health_path();
    let stats = cfg.proxy().stats_path();

    for (key, path) in [("proxy.health_path", health), ("proxy.stats_path", stats)] {
        if !path.starts_with('/') {
            report.error(format!("{key} '{path}' must start with '/'"));
        }
    }

    if health == stats {
        report.error(format!(
            "proxy.health_path and proxy.stats_path are both '{health}'"
        ));
    }
}

fn validate_cache(cfg: &StashConfig, report: &mut ConfigReport) {
    if cfg.cache().max_entries() == 0 && !cfg.cache().sweeper_enabled() {
        report.warn(
            "cache.max_entries is 0 and the sweeper is disabled; entries are only replaced, never removed",
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::StashConfig;

    #[test]
    fn default_config_is_valid() {
        let report = StashConfig::default().validate();
        assert!(report.is_ok(), "{}", report.format());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn https_upstream_is_rejected() {
        let mut cfg = StashConfig::default();
        cfg.proxy.upstream = "https://api.example:443".into();
        let report = cfg.validate();
        assert!(report.has_errors());
        assert!(report.errors()[0].contains("https"));
    }

    #[test]
    fn upstream_with_path_is_rejected() {
        let mut cfg = StashConfig::default();
        cfg.proxy.upstream = "http://api.example:8080/v1".into();
        assert!(cfg.validate().has_errors());
    }

    #[test]
    fn upstream_without_port_warns() {
        let mut cfg = StashConfig::default();
        cfg.proxy.upstream = "api.example".into();
        let report = cfg.validate();
        assert!(report.is_ok());
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn colliding_endpoint_paths_are_rejected() {
        let mut cfg = StashConfig::default();
        cfg.proxy.stats_path = cfg.proxy.health_path.clone();
        assert!(cfg.validate().has_errors());

        cfg.proxy.stats_path = "stats".into();
        let report = cfg.validate();
        assert!(report.format().contains("must start with '/'"));
    }

    #[test]
    fn unbounded_cache_without_sweeper_warns() {
        let mut cfg = StashConfig::default();
        cfg.cache.sweep_interval_secs = 0;
        let report = cfg.validate();
        assert!(report.is_ok());
        assert!(report.warnings()[0].contains("never removed"));
    }
}
