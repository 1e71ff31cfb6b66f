use serde::Deserialize;

use crate::validation::{validate, ConfigReport};
use crate::{CacheConfig, GlobalConfig, ProxyConfig};

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "stash.conf";

/// Prefix of environment variables that override file values,
/// e.g. `STASH_PROXY__UPSTREAM=10.0.0.2:8080`.
pub const ENV_PREFIX: &str = "STASH";

// =======================================================
// STASH CONFIG: main config
// =======================================================
#[derive(Debug, Clone, Deserialize)]
pub struct StashConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for StashConfig {
    fn default() -> Self {
        let mut cfg = Self {
            global: GlobalConfig::default(),
            proxy: ProxyConfig::default(),
            cache: CacheConfig::default(),
        };
        cfg.apply_defaults();
        cfg
    }
}

impl StashConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: StashConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("Invalid config in '{file_name}':");
                    eprintln!("{}", report.format());
                    eprintln!("Using default config (in-memory)...");
                    StashConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        eprintln!("Config warnings in '{file_name}':");
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("Error reading config '{file_name}': {e}");
                eprintln!("Using default config (in-memory)...");
                StashConfig::default()
            }
        }
    }

    fn apply_defaults(&mut self) {
        let def_global = GlobalConfig::default();
        self.global.apply_defaults_from(&def_global);

        let def_proxy = ProxyConfig::default();
        self.proxy.apply_defaults_from(&def_proxy);

        let def_cache = CacheConfig::default();
        self.cache.apply_defaults_from(&def_cache);
    }

    pub fn print(&self) {
        println!("================ STASH CONFIG ================");
        self.print_global();
        self.print_proxy();
        self.print_cache();
        println!("==============================================");
    }

    fn print_global(&self) {
        println!("\n[global]");
        println!(
            "  worker_connections   = {}",
            self.global.worker_connections
        );
        println!("  log_level            = {}", self.global.log_level);
    }

    fn print_proxy(&self) {
        println!("\n[proxy]");
        println!("  listen               = {}", self.proxy.listen);
        println!("  upstream             = {}", self.proxy.upstream);
        println!(
            "  cache_timeout_secs   = {}",
            self.proxy.cache_timeout_secs
        );
        println!(
            "  upstream_timeout_secs = {}",
            self.proxy.upstream_timeout_secs
        );
        println!(
            "  max_request_body_bytes = {}",
            self.proxy.max_request_body_bytes
        );
        println!(
            "  max_upstream_response_body_bytes = {}",
            self.proxy.max_upstream_response_body_bytes
        );
        println!("  health_path          = {}", self.proxy.health_path);
        println!("  stats_path           = {}", self.proxy.stats_path);
    }

    fn print_cache(&self) {
        println!("\n[cache]");
        println!("  max_entries          = {}", self.cache.max_entries);
        println!(
            "  sweep_interval_secs  = {}",
            self.cache.sweep_interval_secs
        );
        println!("  sweep_after          = {}", self.cache.sweep_after);
    }
}
