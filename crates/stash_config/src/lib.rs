//! Configuration model for the stash proxy.
//!
//! Sections map one-to-one onto the INI file (`[global]`, `[proxy]`,
//! `[cache]`); `STASH_<SECTION>__<KEY>` environment variables override them.

mod cache;
mod global;
mod proxy;
mod stash;
mod validation;

pub use cache::CacheConfig;
pub use global::GlobalConfig;
pub use proxy::{ProxyConfig, DEFAULT_HEALTH_PATH, DEFAULT_STATS_PATH};
pub use stash::{StashConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use validation::{validate, ConfigReport};
