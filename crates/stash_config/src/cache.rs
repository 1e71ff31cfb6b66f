use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached responses. 0 keeps the cache unbounded.
    pub max_entries: usize,
    /// Period of the background sweep in seconds. 0 disables the sweeper.
    pub sweep_interval_secs: u64,
    /// Entries older than `sweep_after` cache timeouts are dropped by the sweep.
    pub sweep_after: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 0,
            sweep_interval_secs: 60,
            sweep_after: 4,
        }
    }
}

impl CacheConfig {
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.sweep_interval_secs
    }

    pub fn sweep_after(&self) -> u32 {
        self.sweep_after
    }

    pub fn sweeper_enabled(&self) -> bool {
        self.sweep_interval_secs > 0
    }

    // `max_entries` and `sweep_interval_secs` keep their zero meaning.
    pub(crate) fn apply_defaults_from(&mut self, defaults: &CacheConfig) {
        if self.sweep_after == 0 {
            self.sweep_after = defaults.sweep_after;
        }
    }
}
