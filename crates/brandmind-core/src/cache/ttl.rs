//! Capacity- and age-bounded in-memory map.
//!
//! Entries expire `ttl` after they were written. Reads never extend an
//! entry's life and never change its eviction position; only `set` does.
//! When a new key is inserted into a full cache, the least recently written
//! entry is evicted first.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// A cached value with the instant it was written and its time-to-live.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Valid iff `now - stored_at <= ttl`.
    pub fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

struct Slot<V> {
    entry: CacheEntry<V>,
    /// Write sequence number; the smallest live number is evicted first.
    seq: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Slot<V>>,
    write_order: BTreeMap<u64, K>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.remove(key) {
            Some(slot) => {
                self.write_order.remove(&slot.seq);
                true
            }
            None => false,
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Bounded time-to-live cache shared across tasks.
///
/// A capacity of zero disables the cache: `set` is a no-op.
pub struct BoundedTtlCache<K, V> {
    name: &'static str,
    capacity: usize,
    default_ttl: Duration,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache. `name` only appears in trace logs.
    pub fn new(name: &'static str, capacity: usize, default_ttl: Duration) -> Self {
        Self {
            name,
            capacity,
            default_ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity.min(1024)),
                write_order: BTreeMap::new(),
                next_seq: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return a clone of the value, or `None` if absent or expired.
    ///
    /// Expired entries are removed as a side effect.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let mut inner = self.lock();

        let valid = inner.entries.get(key)?.entry.is_valid(now);
        if !valid {
            inner.remove(key);
            tracing::trace!(cache = self.name, "expired entry purged on read");
            return None;
        }
        inner.entries.get(key).map(|slot| slot.entry.value.clone())
    }

    /// Insert or overwrite with the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert or overwrite with an explicit TTL.
    ///
    /// Overwriting resets `stored_at` and moves the key to the back of the
    /// eviction order without evicting anything else.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }

        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };

        let mut inner = self.lock();
        let seq = inner.take_seq();

        if let Some(old_seq) = inner.entries.get(&key).map(|slot| slot.seq) {
            inner.write_order.remove(&old_seq);
        } else if inner.entries.len() >= self.capacity {
            if let Some((_, oldest)) = inner.write_order.pop_first() {
                inner.entries.remove(&oldest);
                tracing::trace!(cache = self.name, "evicted least recently written entry");
            }
        }

        inner.write_order.insert(seq, key.clone());
        inner.entries.insert(key, Slot { entry, seq });
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().remove(key)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.write_order.clear();
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, slot)| !slot.entry.is_valid(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<K, V> std::fmt::Debug for BoundedTtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
