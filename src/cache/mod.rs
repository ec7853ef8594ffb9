//! Caching module for the flight aggregator
//!
//! Bounded, time-expiring store for search responses. Entries expire a fixed
//! TTL after insertion and are evicted oldest-inserted first when full.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Store<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order; may hold keys already purged from `entries`
    order: VecDeque<String>,
}

/// Cache for search results
///
/// Lookups share a read lock; insertion and eviction happen together under
/// the write lock.
pub struct ResultCache<V> {
    store: RwLock<Store<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> ResultCache<V> {
    /// Create a new result cache with the given capacity and TTL
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            store: RwLock::new(Store {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Store<V>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store<V>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a cached value, purging it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let store = self.read();
            match store.entries.get(key) {
                None => return None,
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut store = self.write();
        // A concurrent insert may have refreshed the entry in the meantime
        if let Some(entry) = store.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
            store.entries.remove(key);
            store.order.retain(|k| k != key);
            debug!("Purged expired cache entry {}", key);
        }
        None
    }

    /// Store a value, evicting the oldest-inserted live entry when full
    pub fn insert(&self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }

        let now = Instant::now();
        let mut store = self.write();

        if store.entries.remove(&key).is_some() {
            store.order.retain(|k| k != &key);
        }

        if store.entries.len() >= self.capacity {
            Self::purge_expired(&mut store, now);
        }

        while store.entries.len() >= self.capacity {
            match store.order.pop_front() {
                Some(oldest) => {
                    if store.entries.remove(&oldest).is_some() {
                        debug!("Evicted cache entry {}", oldest);
                    }
                }
                None => break,
            }
        }

        store.order.push_back(key.clone());
        store.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    fn purge_expired(store: &mut Store<V>, now: Instant) {
        store.entries.retain(|_, entry| entry.expires_at > now);
        let Store { entries, order } = store;
        order.retain(|key| entries.contains_key(key));
    }

    /// Remove a cached value
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.write();
        let entry = store.entries.remove(key)?;
        store.order.retain(|k| k != key);
        Some(entry.value)
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        let mut store = self.write();
        store.entries.clear();
        store.order.clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.read()
            .entries
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(300)) // 5 minutes TTL, 1k max entries
    }
}
