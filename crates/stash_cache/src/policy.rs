use std::time::Duration;

/// How long entries stay fresh and how the store is bounded.
#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    timeout: Duration,
    max_entries: usize,
    sweep_after: u32,
}

impl CachePolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_entries: 0,
            sweep_after: 4,
        }
    }

    /// 0 keeps the store unbounded.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_sweep_after(mut self, sweep_after: u32) -> Self {
        self.sweep_after = sweep_after;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Entries older than this are removed by a sweep.
    pub fn sweep_horizon(&self) -> Duration {
        self.timeout.saturating_mul(self.sweep_after.max(1))
    }
}
