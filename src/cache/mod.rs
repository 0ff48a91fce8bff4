//! Block Cache
//!
//! Fixed-capacity store of remote blocks keyed by `(disk, block)`, sitting in
//! front of the JBOD transport so repeated reads skip the network round-trip.
//!
//! # Design
//!
//! - One owned slot vector sized at creation; empty slots are `None`
//! - A logical clock stamps every lookup and insertion attempt
//! - On a full cache the slot with the lowest stamp is overwritten, ties going
//!   to the first slot in scan order
//! - Linear scans only: capacity tops out at 4096 and a scan is far cheaper
//!   than the remote operation it replaces

mod block_cache;
mod entry;
mod metrics;

pub use block_cache::{BlockCache, InsertOutcome};
pub use entry::{BlockKey, CacheEntry};
pub use metrics::CacheStats;

/// Smallest accepted cache capacity
pub const MIN_CACHE_ENTRIES: usize = 2;

/// Largest accepted cache capacity
pub const MAX_CACHE_ENTRIES: usize = 4096;

// =============================================================================
// Tests
// =============================================================================
