use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::model::WeatherResult;

/// Default time-to-live for cached lookups.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60);

struct CacheEntry {
    value: WeatherResult,
    stored_at: Instant,
}

/// TTL-keyed store of normalized lookup results.
///
/// Keys are the trimmed, lowercased city names. Entries are overwritten on
/// every successful lookup and lapse silently; stale entries are replaced
/// lazily by the next miss. Safe for concurrent readers and writers; a read
/// never observes a partially written entry. Not persisted.
pub struct WeatherCache {
    ttl: Duration,
    capacity: Option<usize>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl WeatherCache {
    /// Unbounded cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            capacity: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache bounded to `capacity` entries; when full, the least recently
    /// written entry is evicted to make room.
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: Some(capacity.max(1)),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if present and still fresh.
    pub fn get(&self, key: &str) -> Option<WeatherResult> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Insert or overwrite `key` with a fresh TTL.
    pub fn put(&self, key: &str, value: WeatherResult) {
        let mut entries = self.entries.write();
        if let Some(capacity) = self.capacity {
            if !entries.contains_key(key) && entries.len() >= capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for WeatherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .field("entries", &self.len())
            .finish()
    }
}
