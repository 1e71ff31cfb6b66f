use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body::Body;
use tokio::time::Instant;
use tracing::debug;

use crate::entry::{CachedEntry, CapturedResponse};
use crate::error::{BoxError, CacheError};
use crate::key::CacheKey;
use crate::policy::CachePolicy;
use crate::stats::{CacheStats, Counters};
use crate::store::MemoryCacheStore;

/// Outcome of a cache lookup.
#[derive(Clone, Debug)]
pub enum Lookup {
    NotFound,
    Stale,
    Fresh(CapturedResponse),
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::NotFound => "miss",
            Lookup::Stale => "stale",
            Lookup::Fresh(_) => "hit",
        }
    }
}

/// In-memory response cache keyed by request fingerprint.
///
/// Freshness is judged against a single timeout fixed at construction: an
/// entry is fresh while `now - stored_at < timeout`.
#[derive(Debug)]
pub struct ResponseCache {
    policy: CachePolicy,
    store: MemoryCacheStore,
    counters: Counters,
}

impl ResponseCache {
    pub fn new(timeout: Duration) -> Self {
        Self::with_policy(CachePolicy::new(timeout))
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            policy,
            store: MemoryCacheStore::new(),
            counters: Counters::default(),
        }
    }

    /// Looks up the response stored for `req`. The body is read to build the
    /// key and an identical body is put back on the request.
    pub async fn fetch<B>(&self, req: &mut Request<B>) -> Result<Lookup, CacheError>
    where
        B: Body + From<Bytes>,
        B::Error: Into<BoxError>,
    {
        let key = CacheKey::from_request(req).await?;
        Ok(self.lookup(&key))
    }

    pub fn lookup(&self, key: &CacheKey) -> Lookup {
        let Some(entry) = self.store.get(key) else {
            self.counters.miss();
            debug!(target: "stash::cache", key = %key, "cache miss");
            return Lookup::NotFound;
        };

        let now = Instant::now();
        if entry.is_fresh(self.policy.timeout(), now) {
            self.counters.hit();
            debug!(
                target: "stash::cache",
                key = %key,
                age_ms = entry.age(now).as_millis() as u64,
                "cache hit"
            );
            Lookup::Fresh(entry.response)
        } else {
            self.counters.stale();
            debug!(
                target: "stash::cache",
                key = %key,
                age_ms = entry.age(now).as_millis() as u64,
                "cache entry stale"
            );
            Lookup::Stale
        }
    }

    /// Stores `response` for `req`, replacing any previous entry and
    /// stamping it with the current time.
    pub async fn upsert<B>(
        &self,
        req: &mut Request<B>,
        response: CapturedResponse,
    ) -> Result<(), CacheError>
    where
        B: Body + From<Bytes>,
        B::Error: Into<BoxError>,
    {
        let key = CacheKey::from_request(req).await?;
        self.insert(key, response);
        Ok(())
    }

    pub fn insert(&self, key: CacheKey, response: CapturedResponse) {
        let entry = CachedEntry::new(response, Instant::now());
        debug!(target: "stash::cache", key = %key, status = %entry.response.status, "cache store");

        if let Some(evicted) = self.store.insert(key, entry, self.policy.max_entries()) {
            self.counters.evicted();
            debug!(target: "stash::cache", key = %evicted, "cache evicted oldest entry");
        }
        self.counters.store();
    }

    /// Removes entries older than the policy's sweep horizon.
    pub fn sweep(&self) -> usize {
        let removed = self
            .store
            .remove_older_than(self.policy.sweep_horizon(), Instant::now());
        if removed > 0 {
            self.counters.swept(removed);
            debug!(target: "stash::cache", removed, "cache sweep");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.policy.timeout()
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }
}
