//! Address Translation and Request Splitting
//!
//! A linear volume address maps onto `(disk, block, offset)`. A request is
//! cut into per-block [`Segment`]s, each moving
//! `min(remaining, BLOCK_SIZE - offset)` bytes.

use std::ops::Range;

use crate::cache::BlockKey;
use crate::config::ArrayGeometry;
use crate::protocol::{Block, BLOCK_SIZE};

/// A byte position on the array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAddress {
    pub disk: u32,
    pub block: u32,
    pub offset: usize,
}

impl BlockAddress {
    /// Translate a linear address. The caller guarantees
    /// `address < geometry.total_capacity()`.
    pub fn translate(address: u64, geometry: &ArrayGeometry) -> Self {
        let disk_size = geometry.disk_size();
        let within_disk = address % disk_size;
        Self {
            disk: (address / disk_size) as u32,
            block: (within_disk / BLOCK_SIZE as u64) as u32,
            offset: (within_disk % BLOCK_SIZE as u64) as usize,
        }
    }

    #[inline]
    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.disk, self.block)
    }
}

/// The part of a request that falls inside one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Where the segment starts on the array
    pub location: BlockAddress,
    /// Bytes in this segment
    pub len: usize,
    /// Where the segment starts in the caller's buffer
    pub buf_offset: usize,
}

impl Segment {
    /// Byte range inside the block
    #[inline]
    pub fn block_range(&self) -> Range<usize> {
        self.location.offset..self.location.offset + self.len
    }

    /// Byte range inside the caller's buffer
    #[inline]
    pub fn buf_range(&self) -> Range<usize> {
        self.buf_offset..self.buf_offset + self.len
    }

    /// Whether the segment overwrites the entire block
    #[inline]
    pub fn covers_block(&self) -> bool {
        self.len == BLOCK_SIZE
    }

    /// Copy this segment's bytes out of `block` into the caller's buffer.
    pub fn copy_out(&self, block: &Block, buf: &mut [u8]) {
        buf[self.buf_range()].copy_from_slice(&block[self.block_range()]);
    }

    /// Splice this segment's bytes from the caller's data into `block`,
    /// leaving the rest of the block untouched.
    pub fn splice_into(&self, block: &mut Block, data: &[u8]) {
        block[self.block_range()].copy_from_slice(&data[self.buf_range()]);
    }
}

/// Iterator over the per-block segments of a request
#[derive(Debug, Clone)]
pub struct Segments {
    geometry: ArrayGeometry,
    address: u64,
    buf_offset: usize,
    remaining: usize,
}

impl Segments {
    /// Split `len` bytes starting at `address`. The caller guarantees the
    /// span lies inside the volume.
    pub fn new(address: u64, len: usize, geometry: ArrayGeometry) -> Self {
        Self {
            geometry,
            address,
            buf_offset: 0,
            remaining: len,
        }
    }
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.remaining == 0 {
            return None;
        }

        let location = BlockAddress::translate(self.address, &self.geometry);
        let len = self.remaining.min(BLOCK_SIZE - location.offset);
        let segment = Segment {
            location,
            len,
            buf_offset: self.buf_offset,
        };

        self.address += len as u64;
        self.buf_offset += len;
        self.remaining -= len;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let lead = (self.address % BLOCK_SIZE as u64) as usize;
        let count = (lead + self.remaining).div_ceil(BLOCK_SIZE);
        (count, Some(count))
    }
}

impl ExactSizeIterator for Segments {}

// =============================================================================
// Tests
// =============================================================================
