//! JBOD Wire Protocol
//!
//! Every operation is one request frame answered by one response frame over a
//! byte stream.
//!
//! # Frame Layout
//!
//! ```text
//! ┌────────────┬──────────────┬────────────┬──────────────────────────┐
//! │ length u16 │  opcode u32  │ status u16 │ block [u8; 256] (opt.)   │
//! │  bytes 0-1 │  bytes 2-5   │ bytes 6-7  │ bytes 8-263              │
//! └────────────┴──────────────┴────────────┴──────────────────────────┘
//! ```
//!
//! All integers are big-endian. `length` is 8 for a bare header or 264 when a
//! block follows; a receiver reads the trailing block purely from `length`.
//! Requests carry a block only for `WRITE_BLOCK`; responses carry one only for
//! `READ_BLOCK`.
//!
//! # Opcode Layout
//!
//! ```text
//!  31        26 25    22 21                                   0
//! ┌────────────┬────────┬──────────────────────────────────────┐
//! │  command   │  disk  │                block                 │
//! └────────────┴────────┴──────────────────────────────────────┘
//! ```

mod opcode;
mod packet;
mod proptest;

pub use opcode::{Command, Opcode};
pub use packet::{Header, Packet};

/// Size of one remote block in bytes
pub const BLOCK_SIZE: usize = 256;

/// Size of the frame header in bytes
pub const HEADER_LEN: usize = 8;

/// Size of a frame carrying a block
pub const FRAME_WITH_BLOCK_LEN: usize = HEADER_LEN + BLOCK_SIZE;

/// Status word of a successful operation
pub const STATUS_OK: u16 = 0;

/// Status word the array returns for a rejected operation (-1 as u16)
pub const STATUS_FAILED: u16 = 0xFFFF;

/// Bit position of the command field
pub const COMMAND_SHIFT: u32 = 26;

/// Bit position of the disk field
pub const DISK_SHIFT: u32 = 22;

/// Largest value the 6-bit command field holds
pub const COMMAND_FIELD_MAX: u32 = (1 << 6) - 1;

/// Largest value the 4-bit disk field holds
pub const DISK_FIELD_MAX: u32 = (1 << 4) - 1;

/// Largest value the 22-bit block field holds
pub const BLOCK_FIELD_MAX: u32 = (1 << DISK_SHIFT) - 1;

/// One remote block
pub type Block = [u8; BLOCK_SIZE];

// =============================================================================
// Tests
// =============================================================================
