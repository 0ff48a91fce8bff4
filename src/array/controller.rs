//! Array Controller
//!
//! Owns the mount state, the optional block cache and the transport, and turns
//! arbitrary-length reads and writes into per-block seek/read/write sequences.

use tracing::{debug, info, warn};

use super::address::Segments;
use crate::cache::{BlockCache, BlockKey, CacheStats};
use crate::config::{ArrayGeometry, ClientConfig, MAX_IO_SIZE};
use crate::error::{Error, Result};
use crate::protocol::{Block, Opcode, BLOCK_SIZE, STATUS_OK};
use crate::transport::{BlockTransport, JbodConnection};

/// Controller presenting a JBOD array as one linear volume
pub struct ArrayController<T> {
    transport: T,
    geometry: ArrayGeometry,
    cache: Option<BlockCache>,
    mounted: bool,
    /// Block the remote cursor is known to rest on
    cursor: Option<BlockKey>,
}

impl ArrayController<JbodConnection> {
    /// Connect to the service named in `config` and enable the configured
    /// cache, if any. The array is left unmounted.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = JbodConnection::connect(&config.host, config.port)?;
        let mut controller = Self::with_geometry(transport, config.geometry);
        if let Some(entries) = config.cache_entries {
            controller.create_cache(entries)?;
        }
        Ok(controller)
    }

    /// Close the connection. The array is not unmounted first.
    pub fn disconnect(self) {
        if self.mounted {
            warn!("Disconnecting while the array is still mounted");
        }
        self.transport.disconnect();
    }
}

impl<T: BlockTransport> ArrayController<T> {
    /// Create a controller for the default array shape.
    pub fn new(transport: T) -> Self {
        Self::with_geometry(transport, ArrayGeometry::default())
    }

    pub fn with_geometry(transport: T, geometry: ArrayGeometry) -> Self {
        Self {
            transport,
            geometry,
            cache: None,
            mounted: false,
            cursor: None,
        }
    }

    pub fn geometry(&self) -> ArrayGeometry {
        self.geometry
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // =========================================================================
    // Cache Lifecycle
    // =========================================================================

    /// Enable a block cache with `capacity` slots.
    pub fn create_cache(&mut self, capacity: usize) -> Result<()> {
        if self.cache.is_some() {
            return Err(Error::CacheAlreadyEnabled);
        }
        self.cache = Some(BlockCache::with_geometry(capacity, self.geometry)?);
        info!(capacity, "Block cache enabled");
        Ok(())
    }

    /// Drop the block cache and everything in it.
    pub fn destroy_cache(&mut self) -> Result<()> {
        let cache = self.cache.take().ok_or(Error::CacheNotEnabled)?;
        info!(entries = cache.len(), "Block cache destroyed");
        Ok(())
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache(&self) -> Option<&BlockCache> {
        self.cache.as_ref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(BlockCache::stats)
    }

    /// Log the cache hit rate and return it. `None` without a cache or before
    /// the first lookup.
    pub fn report_hit_rate(&self) -> Option<f64> {
        self.cache.as_ref().and_then(BlockCache::report_hit_rate)
    }

    // =========================================================================
    // Mount State
    // =========================================================================

    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(Error::AlreadyMounted);
        }
        self.issue(Opcode::mount(), &mut [0u8; BLOCK_SIZE])?;
        self.mounted = true;
        self.cursor = None;
        info!("Array mounted");
        Ok(())
    }

    pub fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(Error::NotMounted);
        }
        self.issue(Opcode::unmount(), &mut [0u8; BLOCK_SIZE])?;
        self.mounted = false;
        self.cursor = None;
        info!("Array unmounted");
        Ok(())
    }

    // =========================================================================
    // Array I/O
    // =========================================================================

    /// Move the remote cursor to `(disk, block)`.
    pub fn seek(&mut self, disk: u32, block: u32) -> Result<()> {
        if !self.mounted {
            return Err(Error::NotMounted);
        }
        let to_disk = Opcode::seek_to_disk(disk)?;
        let to_block = Opcode::seek_to_block(block)?;

        let mut scratch = [0u8; BLOCK_SIZE];
        self.issue(to_disk, &mut scratch)?;
        self.issue(to_block, &mut scratch)?;
        self.cursor = Some(BlockKey::new(disk, block));
        Ok(())
    }

    /// Read `buf.len()` bytes starting at `address`.
    ///
    /// Returns the number of bytes copied. On error nothing is reported about
    /// how much of `buf` was filled.
    pub fn read(&mut self, address: u64, buf: &mut [u8]) -> Result<usize> {
        self.check_request(address, buf.len())?;

        let mut copied = 0;
        for segment in Segments::new(address, buf.len(), self.geometry) {
            let key = segment.location.key();
            let block = match self.cached_block(key) {
                Some(block) => block,
                None => {
                    let block = self.fetch_block(key)?;
                    self.cache_block(key, &block);
                    block
                }
            };
            segment.copy_out(&block, buf);
            copied += segment.len;
        }

        debug!(address, len = copied, "Read complete");
        Ok(copied)
    }

    /// Read `len` bytes starting at `address` into a new buffer.
    pub fn read_vec(&mut self, address: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read(address, &mut buf)?;
        Ok(buf)
    }

    /// Write `data` starting at `address`.
    ///
    /// Blocks only partly covered by `data` are merged with their current
    /// content, taken from the cache when present and from the array
    /// otherwise. Every merged block is written through to both.
    pub fn write(&mut self, address: u64, data: &[u8]) -> Result<usize> {
        self.check_request(address, data.len())?;

        let mut written = 0;
        for segment in Segments::new(address, data.len(), self.geometry) {
            let key = segment.location.key();
            let mut block = if segment.covers_block() {
                [0u8; BLOCK_SIZE]
            } else {
                match self.cached_block(key) {
                    Some(block) => block,
                    None => self.fetch_block(key)?,
                }
            };

            segment.splice_into(&mut block, data);
            self.seek_to(key)?;
            self.issue(Opcode::write_block(), &mut block)?;
            self.cursor = None;
            self.cache_block(key, &block);
            written += segment.len;
        }

        debug!(address, len = written, "Write complete");
        Ok(written)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Reject requests that are unmounted, oversized or out of bounds before
    /// any transport call.
    fn check_request(&self, address: u64, len: usize) -> Result<()> {
        if !self.mounted {
            return Err(Error::NotMounted);
        }
        if len > MAX_IO_SIZE {
            return Err(Error::RequestTooLarge {
                len,
                max: MAX_IO_SIZE,
            });
        }
        let capacity = self.geometry.total_capacity();
        match address.checked_add(len as u64) {
            Some(end) if end <= capacity => Ok(()),
            _ => Err(Error::OutOfBounds {
                address,
                len,
                capacity,
            }),
        }
    }

    /// Send one operation, turning a non-zero status into an error. Any
    /// failure forgets the cursor position.
    fn issue(&mut self, opcode: Opcode, block: &mut Block) -> Result<()> {
        let status = match self.transport.execute(opcode, block) {
            Ok(status) => status,
            Err(e) => {
                self.cursor = None;
                return Err(e);
            }
        };
        if status != STATUS_OK {
            warn!(%opcode, status, "JBOD array rejected operation");
            self.cursor = None;
            return Err(Error::RemoteStatus {
                opcode: opcode.raw(),
                status,
            });
        }
        Ok(())
    }

    /// Seek unless the cursor is already on `key`.
    fn seek_to(&mut self, key: BlockKey) -> Result<()> {
        if self.cursor == Some(key) {
            return Ok(());
        }
        self.seek(key.disk, key.block)
    }

    /// Read one whole block from the array.
    fn fetch_block(&mut self, key: BlockKey) -> Result<Block> {
        self.seek_to(key)?;
        let mut block = [0u8; BLOCK_SIZE];
        self.issue(Opcode::read_block(), &mut block)?;
        // The array advances its cursor after block I/O.
        self.cursor = None;
        Ok(block)
    }

    fn cached_block(&mut self, key: BlockKey) -> Option<Block> {
        let cache = self.cache.as_mut()?;
        match cache.lookup(key) {
            Ok(hit) => hit,
            Err(Error::CacheCold) => None,
            Err(e) => {
                warn!(%key, "Block cache lookup failed: {}", e);
                None
            }
        }
    }

    fn cache_block(&mut self, key: BlockKey, block: &Block) {
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.insert(key, block) {
                warn!(%key, "Block cache insert failed: {}", e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
