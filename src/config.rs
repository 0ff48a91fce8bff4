//! Array Geometry and Client Configuration
//!
//! The remote array's shape is a deployment constant, not negotiated over the
//! wire. The defaults match the stock JBOD service: 16 disks of 256 blocks of
//! 256 bytes, for a 1 MiB linear volume.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::{BLOCK_FIELD_MAX, BLOCK_SIZE, DISK_FIELD_MAX};

/// Default number of disks in the array
pub const DEFAULT_DISK_COUNT: u32 = 16;

/// Default number of blocks on each disk
pub const DEFAULT_BLOCKS_PER_DISK: u32 = 256;

/// Largest read or write accepted in a single request
pub const MAX_IO_SIZE: usize = 1024;

/// Default JBOD service address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default JBOD service port
pub const DEFAULT_PORT: u16 = 3333;

// =============================================================================
// Array Geometry
// =============================================================================

/// Shape of the remote disk array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayGeometry {
    disk_count: u32,
    blocks_per_disk: u32,
}

impl Default for ArrayGeometry {
    fn default() -> Self {
        Self {
            disk_count: DEFAULT_DISK_COUNT,
            blocks_per_disk: DEFAULT_BLOCKS_PER_DISK,
        }
    }
}

impl ArrayGeometry {
    /// Create a geometry, checking that every disk and block index it admits
    /// is encodable in an opcode.
    pub fn new(disk_count: u32, blocks_per_disk: u32) -> Result<Self> {
        if disk_count == 0 || disk_count > DISK_FIELD_MAX + 1 {
            return Err(Error::Config(format!(
                "disk count {} must be within [1, {}]",
                disk_count,
                DISK_FIELD_MAX + 1
            )));
        }
        if blocks_per_disk == 0 || blocks_per_disk > BLOCK_FIELD_MAX + 1 {
            return Err(Error::Config(format!(
                "blocks per disk {} must be within [1, {}]",
                blocks_per_disk,
                BLOCK_FIELD_MAX + 1
            )));
        }
        Ok(Self {
            disk_count,
            blocks_per_disk,
        })
    }

    #[inline]
    pub fn disk_count(&self) -> u32 {
        self.disk_count
    }

    #[inline]
    pub fn blocks_per_disk(&self) -> u32 {
        self.blocks_per_disk
    }

    /// Bytes on a single disk
    #[inline]
    pub fn disk_size(&self) -> u64 {
        self.blocks_per_disk as u64 * BLOCK_SIZE as u64
    }

    /// Bytes in the whole linear volume
    #[inline]
    pub fn total_capacity(&self) -> u64 {
        self.disk_count as u64 * self.disk_size()
    }

    /// Whether `(disk, block)` names a block that exists on the array.
    #[inline]
    pub fn contains(&self, disk: u32, block: u32) -> bool {
        disk < self.disk_count && block < self.blocks_per_disk
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Settings for a controller talking to a remote array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JBOD service host
    pub host: String,
    /// JBOD service port
    pub port: u16,
    /// Block cache capacity; `None` runs uncached
    pub cache_entries: Option<usize>,
    /// Array shape
    pub geometry: ArrayGeometry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cache_entries: None,
            geometry: ArrayGeometry::default(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
