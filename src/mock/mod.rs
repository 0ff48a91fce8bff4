//! Mock JBOD Array for Testing
//!
//! An in-memory array that answers the JBOD protocol the way the real service
//! does. Use this for:
//!
//! - Unit and integration testing without a remote service
//! - Counting the operations a controller issues
//! - Local demos via [`MockJbodServer`]
//!
//! Enabled by the `mock-jbod` feature (on by default).

mod server;

pub use server::MockJbodServer;

use tracing::debug;

use crate::config::ArrayGeometry;
use crate::error::Result;
use crate::protocol::{Block, Command, Opcode, BLOCK_SIZE, STATUS_FAILED, STATUS_OK};
use crate::transport::BlockTransport;

/// In-memory JBOD array
#[derive(Debug, Clone)]
pub struct MockJbod {
    geometry: ArrayGeometry,
    /// Disk-major block storage
    blocks: Vec<Block>,
    mounted: bool,
    cursor_disk: u32,
    cursor_block: u32,
    log: Vec<Opcode>,
    record: bool,
}

impl Default for MockJbod {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJbod {
    /// Create a zero-filled array with the default shape.
    pub fn new() -> Self {
        Self::with_geometry(ArrayGeometry::default())
    }

    pub fn with_geometry(geometry: ArrayGeometry) -> Self {
        let count = geometry.disk_count() as usize * geometry.blocks_per_disk() as usize;
        Self {
            geometry,
            blocks: vec![[0u8; BLOCK_SIZE]; count],
            mounted: false,
            cursor_disk: 0,
            cursor_block: 0,
            log: Vec::new(),
            record: true,
        }
    }

    /// Stop recording received opcodes. Long-running servers use this so the
    /// log does not grow without bound.
    pub fn without_operation_log(mut self) -> Self {
        self.record = false;
        self.log = Vec::new();
        self
    }

    pub fn geometry(&self) -> ArrayGeometry {
        self.geometry
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Every opcode received so far, in order
    pub fn operations(&self) -> &[Opcode] {
        &self.log
    }

    pub fn operation_count(&self) -> usize {
        self.log.len()
    }

    /// Number of received opcodes carrying `command`
    pub fn count(&self, command: Command) -> usize {
        self.log
            .iter()
            .filter(|op| op.command_code() == command.code())
            .count()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Stored content of `(disk, block)`
    pub fn block(&self, disk: u32, block: u32) -> Option<&Block> {
        self.index(disk, block).map(|index| &self.blocks[index])
    }

    /// Overwrite a block without going through the protocol.
    pub fn set_block(&mut self, disk: u32, block: u32, data: &Block) -> bool {
        match self.index(disk, block) {
            Some(index) => {
                self.blocks[index] = *data;
                true
            }
            None => false,
        }
    }

    /// Apply one operation and return its status. `block` is read for
    /// `WRITE_BLOCK` and filled for `READ_BLOCK`.
    pub fn handle(&mut self, opcode: Opcode, block: &mut Block) -> u16 {
        if self.record {
            self.log.push(opcode);
        }

        let status = match opcode.command() {
            Ok(Command::Mount) if !self.mounted => {
                self.mounted = true;
                STATUS_OK
            }
            Ok(Command::Unmount) if self.mounted => {
                self.mounted = false;
                STATUS_OK
            }
            Ok(Command::Mount) | Ok(Command::Unmount) => STATUS_FAILED,
            Ok(_) if !self.mounted => STATUS_FAILED,
            Ok(Command::SeekToDisk) if opcode.disk() < self.geometry.disk_count() => {
                self.cursor_disk = opcode.disk();
                STATUS_OK
            }
            Ok(Command::SeekToBlock) if opcode.block() < self.geometry.blocks_per_disk() => {
                self.cursor_block = opcode.block();
                STATUS_OK
            }
            Ok(Command::ReadBlock) => match self.index(self.cursor_disk, self.cursor_block) {
                Some(index) => {
                    *block = self.blocks[index];
                    self.advance();
                    STATUS_OK
                }
                None => STATUS_FAILED,
            },
            Ok(Command::WriteBlock) => match self.index(self.cursor_disk, self.cursor_block) {
                Some(index) => {
                    self.blocks[index] = *block;
                    self.advance();
                    STATUS_OK
                }
                None => STATUS_FAILED,
            },
            Ok(Command::SeekToDisk) | Ok(Command::SeekToBlock) | Err(_) => STATUS_FAILED,
        };

        debug!(%opcode, status, "Mock JBOD handled operation");
        status
    }

    fn index(&self, disk: u32, block: u32) -> Option<usize> {
        self.geometry.contains(disk, block).then(|| {
            disk as usize * self.geometry.blocks_per_disk() as usize + block as usize
        })
    }

    /// Move the cursor one block on, rolling over onto the next disk.
    fn advance(&mut self) {
        self.cursor_block += 1;
        if self.cursor_block == self.geometry.blocks_per_disk() {
            self.cursor_block = 0;
            self.cursor_disk += 1;
        }
    }
}

impl BlockTransport for MockJbod {
    fn execute(&mut self, opcode: Opcode, block: &mut Block) -> Result<u16> {
        Ok(self.handle(opcode, block))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(jbod: &mut MockJbod, opcode: Opcode) -> u16 {
        jbod.handle(opcode, &mut [0u8; BLOCK_SIZE])
    }

    #[test]
    fn test_requires_mount() {
        let mut jbod = MockJbod::new();
        assert_eq!(run(&mut jbod, Opcode::read_block()), STATUS_FAILED);
        assert_eq!(run(&mut jbod, Opcode::unmount()), STATUS_FAILED);
        assert_eq!(run(&mut jbod, Opcode::mount()), STATUS_OK);
        assert_eq!(run(&mut jbod, Opcode::mount()), STATUS_FAILED);
        assert_eq!(jbod.operation_count(), 4);
    }

    #[test]
    fn test_seek_write_read() {
        let mut jbod = MockJbod::new();
        run(&mut jbod, Opcode::mount());
        run(&mut jbod, Opcode::seek_to_disk(3).unwrap());
        run(&mut jbod, Opcode::seek_to_block(7).unwrap());
        let mut data = [0x11; BLOCK_SIZE];
        assert_eq!(jbod.handle(Opcode::write_block(), &mut data), STATUS_OK);
        assert_eq!(jbod.block(3, 7), Some(&[0x11; BLOCK_SIZE]));

        run(&mut jbod, Opcode::seek_to_block(7).unwrap());
        let mut back = [0u8; BLOCK_SIZE];
        jbod.handle(Opcode::read_block(), &mut back);
        assert_eq!(back, [0x11; BLOCK_SIZE]);
    }

    #[test]
    fn test_cursor_rolls_to_next_disk() {
        let mut jbod = MockJbod::with_geometry(ArrayGeometry::new(2, 2).unwrap());
        jbod.set_block(1, 0, &[0x22; BLOCK_SIZE]);
        run(&mut jbod, Opcode::mount());
        run(&mut jbod, Opcode::seek_to_disk(0).unwrap());
        run(&mut jbod, Opcode::seek_to_block(1).unwrap());
        run(&mut jbod, Opcode::read_block());

        let mut next = [0u8; BLOCK_SIZE];
        jbod.handle(Opcode::read_block(), &mut next);
        assert_eq!(next, [0x22; BLOCK_SIZE]);

        // Past the last block there is nothing to read.
        run(&mut jbod, Opcode::read_block());
        assert_eq!(run(&mut jbod, Opcode::read_block()), STATUS_FAILED);
    }

    #[test]
    fn test_operation_log_can_be_disabled() {
        let mut jbod = MockJbod::new().without_operation_log();
        run(&mut jbod, Opcode::mount());
        run(&mut jbod, Opcode::seek_to_disk(1).unwrap());
        let mut data = [0x33; BLOCK_SIZE];
        assert_eq!(jbod.handle(Opcode::write_block(), &mut data), STATUS_OK);

        assert_eq!(jbod.operation_count(), 0);
        assert_eq!(jbod.block(1, 0), Some(&[0x33; BLOCK_SIZE]));
    }

    #[test]
    fn test_rejects_out_of_range_seek() {
        let mut jbod = MockJbod::with_geometry(ArrayGeometry::new(4, 8).unwrap());
        run(&mut jbod, Opcode::mount());
        assert_eq!(run(&mut jbod, Opcode::seek_to_disk(4).unwrap()), STATUS_FAILED);
        assert_eq!(run(&mut jbod, Opcode::seek_to_block(8).unwrap()), STATUS_FAILED);
        assert_eq!(run(&mut jbod, Opcode::from_raw(9 << 26)), STATUS_FAILED);
        assert_eq!(jbod.count(Command::SeekToDisk), 1);
    }
}
