//! Exact-match response cache
//!
//! Keyed by a stable SHA-256 digest of (system prompt, message). Eviction is
//! FIFO on insertion order, not LRU: reads never refresh an entry's position.
//! Expired entries are removed lazily when a lookup touches them.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// A cached response plus provenance
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// Response text
    pub response: String,
    /// Service group of the provider that produced it
    pub engine: String,
    stored_at: Instant,
}

/// Capacity-bounded FIFO cache with per-entry TTL
pub struct ExactCache {
    inner: Mutex<FifoInner>,
    ttl: Duration,
    capacity: usize,
}

struct FifoInner {
    entries: HashMap<String, CachedResponse>,
    /// Insertion order; keys may linger here after lazy expiry and are
    /// skipped during eviction
    order: VecDeque<String>,
}

impl ExactCache {
    /// A cache with the given capacity and TTL
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(FifoInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity,
        }
    }

    /// Stable key over the (system prompt, message) pair
    pub fn key(system: Option<&str>, message: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(system.unwrap_or("").as_bytes());
        hasher.update([0x1f]);
        hasher.update(message.as_bytes());
        format!("c{}", hex::encode(&hasher.finalize()[..16]))
    }

    /// Look up a key, removing the entry if it expired
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut inner = self.inner.lock();
        let fresh = match inner.entries.get(key) {
            Some(entry) => entry.stored_at.elapsed() < self.ttl,
            None => return None,
        };
        if fresh {
            return inner.entries.get(key).cloned();
        }
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    /// Insert a response, evicting the oldest-inserted live entry at capacity.
    /// Re-inserting an existing key refreshes the value without moving it in
    /// the eviction order.
    pub fn put(&self, key: String, response: String, engine: String) {
        let mut inner = self.inner.lock();
        let entry = CachedResponse {
            response,
            engine,
            stored_at: Instant::now(),
        };

        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, entry);
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, entry);
    }

    /// Live entry count
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}
