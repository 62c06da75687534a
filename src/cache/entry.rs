//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with expiry.

use chrono::{DateTime, Duration, Utc};

// == Cache Entry ==
/// A stored payload and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The stored value
    pub value: Vec<u8>,
    /// Expiration instant
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// Returns `None` when the expiration instant is out of range.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `ttl` - How long the entry stays valid
    /// * `now` - The current instant
    pub fn new(value: Vec<u8>, ttl: Duration, now: DateTime<Utc>) -> Option<Self> {
        now.checked_add_signed(ttl)
            .map(|expires_at| Self { value, expires_at })
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// An entry is expired once its expiration instant lies strictly in the
    /// past. At exactly `expires_at` it is still live.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
