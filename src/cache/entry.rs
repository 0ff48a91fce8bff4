//! Cache Entry Types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::Block;

/// Cache key - a block's position on the array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockKey {
    pub disk: u32,
    pub block: u32,
}

impl BlockKey {
    pub fn new(disk: u32, block: u32) -> Self {
        Self { disk, block }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.disk, self.block)
    }
}

/// One cached copy of a remote block
#[derive(Clone)]
pub struct CacheEntry {
    key: BlockKey,
    data: Block,
    access_stamp: u64,
}

impl CacheEntry {
    pub(crate) fn new(key: BlockKey, data: &Block, access_stamp: u64) -> Self {
        Self {
            key,
            data: *data,
            access_stamp,
        }
    }

    #[inline]
    pub fn key(&self) -> BlockKey {
        self.key
    }

    #[inline]
    pub fn data(&self) -> &Block {
        &self.data
    }

    /// Logical clock value of the last touch
    #[inline]
    pub fn access_stamp(&self) -> u64 {
        self.access_stamp
    }

    /// Mark the entry as used at `stamp`.
    #[inline]
    pub(crate) fn touch(&mut self, stamp: u64) {
        self.access_stamp = stamp;
    }

    /// Replace the content and mark the entry as used at `stamp`.
    pub(crate) fn refresh(&mut self, data: &Block, stamp: u64) {
        self.data = *data;
        self.access_stamp = stamp;
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Block content elided.
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("access_stamp", &self.access_stamp)
            .finish_non_exhaustive()
    }
}
