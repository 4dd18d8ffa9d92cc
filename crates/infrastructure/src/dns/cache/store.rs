use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Share of the capacity dropped by one eviction batch.
const BATCH_EVICTION_PERCENTAGE: f64 = 0.1;

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
    hits: AtomicU64,
}

/// Result of a cache read.
pub enum Lookup<V> {
    Fresh(Arc<V>),
    /// Past its TTL, still usable when the store is down
    Stale(Arc<V>),
    Miss,
}

/// Count-bounded map of shared values with TTL staleness and batch LFU
/// eviction. Values are replaced wholesale, never mutated.
pub struct CacheStore<K, V> {
    entries: DashMap<K, CacheEntry<V>, FxBuildHasher>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(capacity.min(4096), FxBuildHasher),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn lookup(&self, key: &K) -> Lookup<V> {
        match self.entries.get(key) {
            Some(entry) => {
                entry.hits.fetch_add(1, Ordering::Relaxed);
                if Instant::now() <= entry.expires_at {
                    Lookup::Fresh(entry.value.clone())
                } else {
                    Lookup::Stale(entry.value.clone())
                }
            }
            None => Lookup::Miss,
        }
    }

    /// Current value regardless of age, without counting a hit.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: Arc<V>) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.batch_evict();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
                hits: AtomicU64::new(0),
            },
        );
    }

    pub fn remove(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry whose key fails `keep`.
    pub fn retain<F>(&self, keep: F)
    where
        F: Fn(&K) -> bool,
    {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the least frequently used share of the entries.
    fn batch_evict(&self) {
        let evict_count = ((self.capacity as f64 * BATCH_EVICTION_PERCENTAGE) as usize).max(1);

        let mut candidates: Vec<(K, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.hits.load(Ordering::Relaxed)))
            .collect();
        candidates.sort_unstable_by_key(|(_, hits)| *hits);

        let mut evicted = 0;
        for (key, _) in candidates.into_iter().take(evict_count) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }

        debug!(evicted = evicted, remaining = self.entries.len(), "Cache batch eviction");
    }
}
