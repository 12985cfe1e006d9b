//! Tick-indexed expiring storage
//!
//! `ExpirationIndex` is the bookkeeping shared by every cache in the
//! workspace: a primary map from key to entry and a map from tick to the set
//! of keys expiring at that tick. A key lives in exactly one bucket while it
//! is stored, and removing it (explicitly or by expiry) clears both sides.

use snmp_core::{CacheError, Handle};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Default entry lifetime in ticks
pub const DEFAULT_TTL: u64 = 600;

struct Slot<V> {
    value: V,
    expire_at: u64,
}

/// Primary map plus per-tick expiration buckets
pub struct ExpirationIndex<K, V> {
    entries: HashMap<K, Slot<V>>,
    buckets: HashMap<u64, HashSet<K>>,
}

impl<K: Eq + Hash + Clone, V> ExpirationIndex<K, V> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            buckets: HashMap::new(),
        }
    }

    /// Insert an entry scheduled to expire at `expire_at`
    ///
    /// # Returns
    /// `Err(value)` with the rejected value if `key` is already present. The
    /// existing entry is left untouched.
    pub fn insert(&mut self, key: K, value: V, expire_at: u64) -> Result<(), V> {
        if self.entries.contains_key(&key) {
            return Err(value);
        }
        self.buckets
            .entry(expire_at)
            .or_default()
            .insert(key.clone());
        self.entries.insert(key, Slot { value, expire_at });
        Ok(())
    }

    /// Remove an entry and its bucket membership
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        if let Some(bucket) = self.buckets.get_mut(&slot.expire_at) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.buckets.remove(&slot.expire_at);
            }
        }
        Some(slot.value)
    }

    /// Remove every entry scheduled for `tick`
    ///
    /// # Returns
    /// The expired keys with their values, in no particular order
    pub fn expire(&mut self, tick: u64) -> Vec<(K, V)> {
        let Some(bucket) = self.buckets.remove(&tick) else {
            return Vec::new();
        };
        bucket
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|slot| (key, slot.value)))
            .collect()
    }

    /// Remove every entry for which `keep` returns false
    ///
    /// # Returns
    /// Number of removed entries
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) -> usize {
        let dropped: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, slot)| !keep(key, &slot.value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dropped {
            self.remove(key);
        }
        dropped.len()
    }

    /// Entry stored under `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Mutable access to an entry; its expiry tick is unchanged
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key).map(|slot| &mut slot.value)
    }

    /// Tick at which `key` is scheduled to expire
    pub fn expire_at(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|slot| slot.expire_at)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty expiration buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl<K: Eq + Hash + Clone, V> Default for ExpirationIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle-keyed cache with tick-driven expiration
///
/// # Expiration Semantics
/// `push` schedules the entry at `clock + ttl`. `tick` first advances the
/// clock by one and then evicts the bucket for the tick just reached, so an
/// entry pushed at clock `c` is still present after `ttl - 1` ticks and gone
/// after `ttl` ticks. Evicted payloads are dropped.
pub struct ExpiringCache<K, V> {
    clock: u64,
    ttl: u64,
    index: ExpirationIndex<K, V>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Copy + Eq + Hash + Into<Handle>,
{
    /// Create a cache whose entries live for `ttl` ticks
    ///
    /// A `ttl` of 0 is raised to 1 so every entry can expire.
    pub fn new(ttl: u64) -> Self {
        Self {
            clock: 0,
            ttl: ttl.max(1),
            index: ExpirationIndex::new(),
        }
    }

    /// Store `payload` under `key`
    ///
    /// # Errors
    /// `CacheError::DuplicateHandle` if `key` is already cached
    pub fn push(&mut self, key: K, payload: V) -> Result<(), CacheError> {
        let expire_at = self.clock + self.ttl;
        self.index
            .insert(key, payload, expire_at)
            .map_err(|_| CacheError::DuplicateHandle(key.into()))?;
        log::debug!("cached handle {} until tick {}", key.into(), expire_at);
        Ok(())
    }

    /// Remove and return the payload stored under `key`
    ///
    /// # Errors
    /// `CacheError::CacheMiss` if `key` was never cached, already popped or
    /// already expired
    pub fn pop(&mut self, key: &K) -> Result<V, CacheError> {
        self.index
            .remove(key)
            .ok_or(CacheError::CacheMiss((*key).into()))
    }

    /// Advance the clock and evict entries scheduled for the new tick
    ///
    /// # Returns
    /// Number of evicted entries
    pub fn tick(&mut self) -> usize {
        self.clock += 1;
        let expired = self.index.expire(self.clock).len();
        if expired > 0 {
            log::debug!("expired {} entries at tick {}", expired, self.clock);
        }
        expired
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current tick count
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Entry lifetime in ticks
    pub fn ttl(&self) -> u64 {
        self.ttl
    }
}

impl<K, V> Default for ExpiringCache<K, V>
where
    K: Copy + Eq + Hash + Into<Handle>,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
