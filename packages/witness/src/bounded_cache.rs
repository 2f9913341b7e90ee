//! Bounded TTL cache of attestation jobs this witness has finished.
//!
//! Memory stays bounded no matter how many commits the source door emits:
//! expired entries are dropped on insert, and when the cache is still full
//! the entry inserted first is evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub struct BoundedCache<K> {
    /// Key -> insertion timestamp
    entries: HashMap<K, Instant>,
    max_size: usize,
    ttl: Duration,
}

impl<K: Hash + Eq + Clone> BoundedCache<K> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_size: max_size.max(1),
            ttl,
        }
    }

    /// Returns true if the key is present and not expired.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .is_some_and(|inserted| inserted.elapsed() < self.ttl)
    }

    /// Insert a key, refreshing its timestamp if already present.
    pub fn insert(&mut self, key: K) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries
            .retain(|_, inserted| now.duration_since(*inserted) < ttl);

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_size {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, inserted)| **inserted)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }

        self.entries.insert(key, now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
