//! Block Cache Implementation
//!
//! Access-stamp eviction over a linear slot scan, approximating LRU without
//! an ordered index.

use tracing::{debug, info};

use super::entry::{BlockKey, CacheEntry};
use super::metrics::CacheStats;
use super::{MAX_CACHE_ENTRIES, MIN_CACHE_ENTRIES};
use crate::config::ArrayGeometry;
use crate::error::{Error, Result};
use crate::protocol::Block;

/// What an insertion did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored in a previously empty slot
    Inserted,
    /// Stored over the least recently stamped entry, whose key is returned
    Evicted(BlockKey),
    /// Key was already cached; content and stamp were refreshed in place
    Refreshed,
}

impl InsertOutcome {
    /// Whether the key was new to the cache
    pub fn is_fresh(&self) -> bool {
        !matches!(self, InsertOutcome::Refreshed)
    }
}

/// Fixed-capacity cache of remote blocks
pub struct BlockCache {
    slots: Vec<Option<CacheEntry>>,
    geometry: ArrayGeometry,
    clock: u64,
    queries: u64,
    hits: u64,
    evictions: u64,
}

impl BlockCache {
    /// Create a cache with `capacity` empty slots for the default array shape.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_geometry(capacity, ArrayGeometry::default())
    }

    /// Create a cache with `capacity` empty slots, accepting only keys that
    /// exist in `geometry`.
    pub fn with_geometry(capacity: usize, geometry: ArrayGeometry) -> Result<Self> {
        if !(MIN_CACHE_ENTRIES..=MAX_CACHE_ENTRIES).contains(&capacity) {
            return Err(Error::InvalidCacheCapacity {
                capacity,
                min: MIN_CACHE_ENTRIES,
                max: MAX_CACHE_ENTRIES,
            });
        }
        Ok(Self {
            slots: vec![None; capacity],
            geometry,
            clock: 0,
            queries: 0,
            hits: 0,
            evictions: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Current logical clock
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Check for `key` without counting a query or moving the clock.
    pub fn contains(&self, key: BlockKey) -> bool {
        self.entry(key).is_some()
    }

    /// Inspect the cached entry for `key` without touching it.
    pub fn entry(&self, key: BlockKey) -> Option<&CacheEntry> {
        self.slots.iter().flatten().find(|entry| entry.key() == key)
    }

    /// Look up `key`, stamping the entry on a hit.
    ///
    /// Fails with [`Error::CacheCold`] until the first insertion, so a fresh
    /// cache never serves anything. `Ok(None)` is a miss.
    pub fn lookup(&mut self, key: BlockKey) -> Result<Option<Block>> {
        if self.clock == 0 {
            return Err(Error::CacheCold);
        }

        self.queries += 1;
        self.clock += 1;
        let stamp = self.clock;

        match self.slots.iter_mut().flatten().find(|entry| entry.key() == key) {
            Some(entry) => {
                self.hits += 1;
                entry.touch(stamp);
                debug!(%key, stamp, "Block cache hit");
                Ok(Some(*entry.data()))
            }
            None => {
                debug!(%key, "Block cache miss");
                Ok(None)
            }
        }
    }

    /// Store `data` under `key`.
    ///
    /// An existing entry is refreshed in place. Otherwise the first empty slot
    /// is used, and once none is left the entry with the lowest access stamp
    /// is overwritten.
    pub fn insert(&mut self, key: BlockKey, data: &Block) -> Result<InsertOutcome> {
        if !self.geometry.contains(key.disk, key.block) {
            return Err(Error::CacheKeyOutOfRange {
                disk: key.disk,
                block: key.block,
            });
        }

        self.clock += 1;
        let stamp = self.clock;

        if let Some(entry) = self
            .slots
            .iter_mut()
            .flatten()
            .find(|entry| entry.key() == key)
        {
            entry.refresh(data, stamp);
            return Ok(InsertOutcome::Refreshed);
        }

        let fresh = CacheEntry::new(key, data, stamp);

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(fresh);
            return Ok(InsertOutcome::Inserted);
        }

        // Every slot is occupied and capacity is at least MIN_CACHE_ENTRIES,
        // so a victim always exists. Ties go to the first slot in scan order.
        let capacity = self.slots.len();
        let victim = self
            .slots
            .iter_mut()
            .flatten()
            .min_by_key(|entry| entry.access_stamp())
            .ok_or(Error::InvalidCacheCapacity {
                capacity,
                min: MIN_CACHE_ENTRIES,
                max: MAX_CACHE_ENTRIES,
            })?;

        let evicted = victim.key();
        *victim = fresh;
        self.evictions += 1;
        debug!(%evicted, %key, "Evicting block cache entry");
        Ok(InsertOutcome::Evicted(evicted))
    }

    /// `hits / queries`, or `None` before the first lookup
    pub fn hit_rate(&self) -> Option<f64> {
        if self.queries == 0 {
            None
        } else {
            Some(self.hits as f64 / self.queries as f64)
        }
    }

    /// Log the hit rate and return it. Advisory only.
    pub fn report_hit_rate(&self) -> Option<f64> {
        let rate = self.hit_rate();
        match rate {
            Some(rate) => info!(
                hits = self.hits,
                queries = self.queries,
                "Hit rate: {:5.1}%",
                100.0 * rate
            ),
            None => info!("Hit rate: no lookups yet"),
        }
        rate
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity(),
            entries: self.len(),
            queries: self.queries,
            hits: self.hits,
            evictions: self.evictions,
            hit_rate: self.hit_rate(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BLOCK_SIZE;

    fn make_block(fill: u8) -> Block {
        [fill; BLOCK_SIZE]
    }

    fn key(disk: u32, block: u32) -> BlockKey {
        BlockKey::new(disk, block)
    }

    #[test]
    fn test_capacity_range() {
        assert!(matches!(
            BlockCache::new(1),
            Err(Error::InvalidCacheCapacity { capacity: 1, .. })
        ));
        assert!(BlockCache::new(4097).is_err());
        assert_eq!(BlockCache::new(2).unwrap().capacity(), 2);
        assert_eq!(BlockCache::new(4096).unwrap().capacity(), 4096);
    }

    #[test]
    fn test_lookup_before_insert_is_cold() {
        let mut cache = BlockCache::new(4).unwrap();
        assert!(matches!(cache.lookup(key(0, 0)), Err(Error::CacheCold)));
        assert_eq!(cache.clock(), 0);
        assert_eq!(cache.stats().queries, 0);
    }

    #[test]
    fn test_insert_then_lookup() {
        let mut cache = BlockCache::new(4).unwrap();
        assert_eq!(
            cache.insert(key(2, 9), &make_block(0x5A)).unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(cache.lookup(key(2, 9)).unwrap(), Some(make_block(0x5A)));
        assert_eq!(cache.lookup(key(2, 10)).unwrap(), None);

        let stats = cache.stats();
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.hit_rate, Some(0.5));
    }

    #[test]
    fn test_empty_slots_never_match() {
        let mut cache = BlockCache::new(4).unwrap();
        cache.insert(key(1, 1), &make_block(1)).unwrap();
        // Unoccupied slots must not masquerade as (0, 0).
        assert_eq!(cache.lookup(key(0, 0)).unwrap(), None);
    }

    #[test]
    fn test_reinsert_refreshes() {
        let mut cache = BlockCache::new(2).unwrap();
        cache.insert(key(0, 1), &make_block(1)).unwrap();
        let outcome = cache.insert(key(0, 1), &make_block(2)).unwrap();
        assert_eq!(outcome, InsertOutcome::Refreshed);
        assert!(!outcome.is_fresh());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(key(0, 1)).unwrap(), Some(make_block(2)));
    }

    #[test]
    fn test_evicts_lowest_stamp() {
        let mut cache = BlockCache::new(3).unwrap();
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        cache.insert(key(0, 1), &make_block(1)).unwrap();
        cache.insert(key(0, 2), &make_block(2)).unwrap();

        let outcome = cache.insert(key(0, 3), &make_block(3)).unwrap();
        assert_eq!(outcome, InsertOutcome::Evicted(key(0, 0)));
        assert!(!cache.contains(key(0, 0)));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_follows_insertion_order() {
        let mut cache = BlockCache::new(2).unwrap();
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        cache.insert(key(0, 1), &make_block(1)).unwrap();

        assert_eq!(
            cache.insert(key(0, 2), &make_block(2)).unwrap(),
            InsertOutcome::Evicted(key(0, 0))
        );
        assert_eq!(
            cache.insert(key(0, 3), &make_block(3)).unwrap(),
            InsertOutcome::Evicted(key(0, 1))
        );
        assert_eq!(cache.lookup(key(0, 2)).unwrap(), Some(make_block(2)));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_lookup_protects_from_eviction() {
        let mut cache = BlockCache::new(3).unwrap();
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        cache.insert(key(0, 1), &make_block(1)).unwrap();
        cache.insert(key(0, 2), &make_block(2)).unwrap();

        // Touch the oldest entry; the next oldest becomes the victim.
        cache.lookup(key(0, 0)).unwrap();
        let outcome = cache.insert(key(1, 0), &make_block(9)).unwrap();
        assert_eq!(outcome, InsertOutcome::Evicted(key(0, 1)));
        assert!(cache.contains(key(0, 0)));
        assert_eq!(cache.entry(key(0, 0)).unwrap().access_stamp(), 4);
    }

    #[test]
    fn test_clock_advances_on_every_attempt() {
        let mut cache = BlockCache::new(2).unwrap();
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        assert_eq!(cache.clock(), 1);
        cache.lookup(key(5, 5)).unwrap();
        assert_eq!(cache.clock(), 2);
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        assert_eq!(cache.clock(), 3);
    }

    #[test]
    fn test_key_range_is_exclusive() {
        let geometry = ArrayGeometry::new(2, 4).unwrap();
        let mut cache = BlockCache::with_geometry(2, geometry).unwrap();
        assert!(matches!(
            cache.insert(key(2, 0), &make_block(0)),
            Err(Error::CacheKeyOutOfRange { disk: 2, block: 0 })
        ));
        assert!(cache.insert(key(0, 4), &make_block(0)).is_err());
        assert!(cache.insert(key(1, 3), &make_block(0)).is_ok());
        // Rejected inserts leave the clock alone.
        assert_eq!(cache.clock(), 1);
    }

    #[test]
    fn test_hit_rate_undefined_without_queries() {
        let mut cache = BlockCache::new(2).unwrap();
        cache.insert(key(0, 0), &make_block(0)).unwrap();
        assert_eq!(cache.hit_rate(), None);
    }
}
