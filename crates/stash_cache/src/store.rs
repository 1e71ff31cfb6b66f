use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::entry::CachedEntry;
use crate::key::CacheKey;

#[derive(Debug)]
struct Slot {
    entry: CachedEntry,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, Slot>,
    // Oldest first; `seq` breaks ties between equal timestamps.
    order: BTreeMap<(Instant, u64), CacheKey>,
    next_seq: u64,
}

/// Key to entry map plus an index ordered by `stored_at`, so eviction and
/// sweeping only touch the entries they remove.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    inner: RwLock<Inner>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .map(|slot| slot.entry.clone())
    }

    /// Inserts or replaces `key`. When a new key arrives and the store already
    /// holds `max_entries` entries, the oldest one is evicted and returned.
    pub fn insert(&self, key: CacheKey, entry: CachedEntry, max_entries: usize) -> Option<CacheKey> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let previous = inner
            .entries
            .get(&key)
            .map(|slot| (slot.entry.stored_at, slot.seq));

        let mut evicted = None;
        match previous {
            Some(position) => {
                inner.order.remove(&position);
            }
            None if max_entries > 0 && inner.entries.len() >= max_entries => {
                if let Some((_, oldest)) = inner.order.pop_first() {
                    inner.entries.remove(&oldest);
                    evicted = Some(oldest);
                }
            }
            None => {}
        }

        inner.order.insert((entry.stored_at, seq), key.clone());
        inner.entries.insert(key, Slot { entry, seq });
        evicted
    }

    /// Drops every entry whose age is at least `horizon`.
    pub fn remove_older_than(&self, horizon: Duration, now: Instant) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let inner = &mut *guard;

        let mut removed = 0;
        while let Some((&(stored_at, _), _)) = inner.order.first_key_value() {
            if now.saturating_duration_since(stored_at) < horizon {
                break;
            }
            if let Some((_, key)) = inner.order.pop_first() {
                inner.entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
