//! Cache Store Module
//!
//! In-memory insert-once cache with lazy expiry, guarded by a single mutex.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::cache::{CacheEntry, Clock, SystemClock};
use crate::error::{CacheError, Result};

// == Event Cache Trait ==
/// Records which events have already been handled.
///
/// `get` reports absent and expired keys as [`CacheError::CacheMiss`];
/// `add` never overwrites a present key and reports
/// [`CacheError::EntryExists`] instead.
pub trait EventCache: Send + Sync {
    /// Stores `value` under `key` for `ttl` unless the key is present.
    fn add(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Returns a copy of the live entry stored under `key`.
    fn get(&self, key: &str) -> Result<CacheEntry>;
}

// == Memory Cache ==
/// Mutex-guarded map from event id to entry.
///
/// Expired entries are only removed when `add` or `get` touches them.
pub struct MemoryCache {
    /// Key-value storage
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty cache reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache reading the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Storage(format!("cache lock poisoned: {}", e)))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|m| m.len()).ok();
        f.debug_struct("MemoryCache").field("entries", &len).finish()
    }
}

impl EventCache for MemoryCache {
    // == Add ==
    /// Stores a value unless the key is already present.
    ///
    /// A present but expired entry is removed, and the call still reports
    /// `EntryExists`. The next `add` for that key succeeds.
    ///
    /// # Arguments
    /// * `key` - Non-empty event identifier
    /// * `value` - Payload to store
    /// * `ttl` - Positive lifetime of the entry
    fn add(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key cannot be empty".to_string()));
        }
        if ttl.is_zero() {
            return Err(CacheError::InvalidRequest("ttl must be positive".to_string()));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| CacheError::InvalidRequest("ttl out of range".to_string()))?;

        let mut entries = self.lock()?;
        let now = self.clock.now();

        if let Some(existing) = entries.get(key) {
            if existing.is_expired(now) {
                entries.remove(key);
            }
            return Err(CacheError::EntryExists(key.to_string()));
        }

        let entry = CacheEntry::new(value.to_vec(), ttl, now)
            .ok_or_else(|| CacheError::InvalidRequest("ttl out of range".to_string()))?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    // == Get ==
    /// Retrieves a copy of the entry stored under `key`.
    ///
    /// Expired entries are removed and reported as misses.
    fn get(&self, key: &str) -> Result<CacheEntry> {
        let mut entries = self.lock()?;
        let now = self.clock.now();

        match entries.get(key) {
            None => Err(CacheError::CacheMiss(key.to_string())),
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Err(CacheError::CacheMiss(key.to_string()))
            }
            Some(entry) => Ok(entry.clone()),
        }
    }
}
