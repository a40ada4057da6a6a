//! Expiring Cache Store
//!
//! This module implements the storage engine behind sessiond. Every entry
//! carries an absolute expiry timestamp (whole unix seconds) and is indexed
//! twice:
//!
//! ```text
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │ storage                      │      │ expiry_index (ordered)       │
//! │  key ──> { expires_at, val } │<────>│  expires_at ──> { key, ... } │
//! └──────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! The primary map answers lookups. The secondary index groups keys into
//! one bucket per expiry second, so a sweep only touches the buckets that
//! have actually passed, and size enforcement can always drop the bucket
//! that was going to expire first.
//!
//! ## Invariants
//!
//! 1. A key is in `storage` with `expires_at = t` iff it is in bucket `t`.
//! 2. The index never holds an empty bucket.
//! 3. `len() <= capacity()` once any mutating call returns.
//!
//! ## Lazy Expiry
//!
//! Reads do not look at the clock. An entry past its expiry second stays
//! readable until the next `insert`, `cleanup` or maintenance cycle sweeps
//! it, which keeps `find` a single hash lookup.

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hard cap on the number of cached sessions.
pub const MAX_ENTRIES: usize = 100_000;

/// Returns the current wall-clock time in whole seconds since the unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A cached value and the second it expires at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Expiry time in unix seconds; the entry is valid through this second
    pub expires_at: u64,
    /// The opaque session blob
    pub value: Bytes,
}

/// What a single `cleanup` pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Entries dropped because their expiry second had passed
    pub expired: usize,
    /// Entries dropped early to bring the store back under its cap
    pub evicted: usize,
}

impl CleanupReport {
    /// Total number of entries removed.
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

/// Key/value store with time-bucketed expiry and a hard size cap.
///
/// The store is not synchronized. It is owned by the request loop and
/// mutated from that single task only.
///
/// # Example
///
/// ```
/// use sessiond::storage::CacheStore;
/// use bytes::Bytes;
///
/// let mut store = CacheStore::new();
///
/// assert!(store.insert_at(Bytes::from("k1"), Bytes::from("v1"), 500, 1_000));
/// assert_eq!(store.find(&Bytes::from("k1")), Some(Bytes::from("v1")));
///
/// // The first writer wins until the entry goes away
/// assert!(!store.insert_at(Bytes::from("k1"), Bytes::from("v2"), 500, 1_000));
/// assert_eq!(store.find(&Bytes::from("k1")), Some(Bytes::from("v1")));
/// ```
#[derive(Debug)]
pub struct CacheStore {
    storage: HashMap<Bytes, CacheEntry>,
    expiry_index: BTreeMap<u64, HashSet<Bytes>>,
    capacity: usize,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Creates an empty store capped at [`MAX_ENTRIES`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    /// Creates an empty store capped at `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: HashMap::new(),
            expiry_index: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Inserts a session that expires `ttl_secs` from now.
    ///
    /// See [`CacheStore::insert_at`].
    pub fn insert(&mut self, key: Bytes, value: Bytes, ttl_secs: u64) -> bool {
        self.insert_at(key, value, ttl_secs, current_timestamp())
    }

    /// Inserts a session that expires `ttl_secs` after `now`.
    ///
    /// Expired entries are purged first. An existing key is never
    /// overwritten: if `key` is still present after the purge this is a
    /// no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new entry was created and is still cached. At
    /// capacity, an entry that expires before everything else is evicted
    /// straight away and `false` is returned.
    pub fn insert_at(&mut self, key: Bytes, value: Bytes, ttl_secs: u64, now: u64) -> bool {
        self.cleanup(now);

        if self.storage.contains_key(&key) {
            return false;
        }

        let expires_at = now.saturating_add(ttl_secs);
        self.expiry_index
            .entry(expires_at)
            .or_default()
            .insert(key.clone());
        self.storage.insert(key.clone(), CacheEntry { expires_at, value });

        // A fresh entry can push the store one over the cap
        self.enforce_capacity();
        self.storage.contains_key(&key)
    }

    /// Looks up a session.
    ///
    /// This never consults the clock, so an entry whose expiry second has
    /// passed is still returned until a sweep removes it.
    pub fn find(&self, key: &[u8]) -> Option<Bytes> {
        self.storage.get(key).map(|entry| entry.value.clone())
    }

    /// Returns the full entry for a key, including its expiry time.
    pub fn get_entry(&self, key: &[u8]) -> Option<&CacheEntry> {
        self.storage.get(key)
    }

    /// Removes a session.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was present.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let Some(entry) = self.storage.remove(key) else {
            return false;
        };

        if let Some(bucket) = self.expiry_index.get_mut(&entry.expires_at) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.expiry_index.remove(&entry.expires_at);
            }
        }
        true
    }

    /// Purges expired entries, then enforces the size cap.
    ///
    /// Every bucket strictly older than `now` is dropped. A bucket stamped
    /// exactly `now` survives: entries are valid through their expiry
    /// second. If the store is still over capacity afterwards, whole buckets
    /// are dropped earliest first until it fits, whether or not they have
    /// expired.
    pub fn cleanup(&mut self, now: u64) -> CleanupReport {
        // split_off keeps everything at or after `now` in the returned map
        let live = self.expiry_index.split_off(&now);
        let expired_buckets = std::mem::replace(&mut self.expiry_index, live);

        let mut expired = 0;
        for (_, keys) in expired_buckets {
            for key in keys {
                if self.storage.remove(&key).is_some() {
                    expired += 1;
                }
            }
        }

        CleanupReport {
            expired,
            evicted: self.enforce_capacity(),
        }
    }

    /// Drops the earliest buckets until the store fits its capacity.
    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.storage.len() > self.capacity {
            let Some((_, keys)) = self.expiry_index.pop_first() else {
                break;
            };
            for key in keys {
                if self.storage.remove(&key).is_some() {
                    evicted += 1;
                }
            }
        }
        evicted
    }

    /// Returns the number of cached sessions.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns the maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of distinct expiry seconds currently indexed.
    pub fn bucket_count(&self) -> usize {
        self.expiry_index.len()
    }

    /// Panics if the primary map and the expiry index disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let indexed: usize = self.expiry_index.values().map(HashSet::len).sum();
        assert_eq!(indexed, self.storage.len(), "index and storage sizes differ");

        for (expires_at, keys) in &self.expiry_index {
            assert!(!keys.is_empty(), "empty bucket at {}", expires_at);
            for key in keys {
                let entry = self.storage.get(key).expect("indexed key missing from storage");
                assert_eq!(entry.expires_at, *expires_at);
            }
        }

        assert!(self.storage.len() <= self.capacity);
    }
}
