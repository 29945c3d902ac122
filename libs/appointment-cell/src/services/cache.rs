// libs/appointment-cell/src/services/cache.rs
use std::collections::HashMap;
use std::time::Duration;

#[cfg(test)]
use mock_instant::Instant;
#[cfg(not(test))]
use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_entries: u64,
    pub hit_rate: f64,
}

/// Snapshot of a key's invalidation history, taken before a read so the
/// read's result can be discarded if the key was invalidated meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeneration {
    epoch: u64,
    key_generation: u64,
}

struct CacheEntry<V> {
    value: V,
    timestamp: Instant,
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    key_generations: HashMap<String, u64>,
    epoch: u64,
    hits: u64,
    misses: u64,
}

/// Time-limited response cache.
///
/// Entries live for exactly `timeout` from when they were written and are
/// dropped lazily the next time they are read. There is no background
/// eviction.
pub struct ResponseCache<V> {
    timeout: Duration,
    state: RwLock<CacheState<V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                key_generations: HashMap::new(),
                epoch: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.write().await;

        let fresh = match state.entries.get(key) {
            Some(entry) => Some(entry.timestamp.elapsed() < self.timeout),
            None => None,
        };

        match fresh {
            Some(true) => {
                state.hits += 1;
                debug!("Cache hit for {}", key);
                state.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                state.entries.remove(key);
                state.misses += 1;
                debug!("Cache entry for {} expired", key);
                None
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: V) {
        let mut state = self.state.write().await;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                timestamp: Instant::now(),
            },
        );
    }

    pub async fn generation(&self, key: &str) -> CacheGeneration {
        let state = self.state.read().await;
        CacheGeneration {
            epoch: state.epoch,
            key_generation: state.key_generations.get(key).copied().unwrap_or(0),
        }
    }

    /// Writes `value` only if `key` has not been invalidated since
    /// `generation` was taken. Returns whether the write happened.
    pub async fn set_if_current(&self, key: &str, value: V, generation: CacheGeneration) -> bool {
        let mut state = self.state.write().await;
        let current = CacheGeneration {
            epoch: state.epoch,
            key_generation: state.key_generations.get(key).copied().unwrap_or(0),
        };

        if current != generation {
            debug!("Discarding stale cache write for {}", key);
            return false;
        }

        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                timestamp: Instant::now(),
            },
        );
        true
    }

    /// Removes `key` and marks any read already in flight for it as stale.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        *state.key_generations.entry(key.to_string()).or_insert(0) += 1;
        let removed = state.entries.remove(key).is_some();
        if removed {
            debug!("Invalidated cache entry {}", key);
        }
        removed
    }

    /// Clears one key, or every key when `key` is `None`.
    pub async fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.invalidate(key).await;
            }
            None => {
                let mut state = self.state.write().await;
                state.entries.clear();
                state.key_generations.clear();
                state.epoch += 1;
                debug!("Cleared all cache entries");
            }
        }
    }

    /// Number of entries that are still fresh.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state
            .entries
            .values()
            .filter(|entry| entry.timestamp.elapsed() < self.timeout)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.len().await as u64;
        let state = self.state.read().await;
        let lookups = state.hits + state.misses;

        CacheStats {
            hits: state.hits,
            misses: state.misses,
            total_entries,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TIMEOUT)
    }
}
