//! Cache Module
//!
//! Provides the expiring insert-once cache used to de-duplicate notifications.

mod clock;
mod entry;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use store::{EventCache, MemoryCache};

// == Public Constants ==
/// Marker payload recorded for a processed event
pub const PROCESSED_MARKER: &[u8] = &[0x1];
