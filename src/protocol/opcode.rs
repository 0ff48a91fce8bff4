//! Opcode Packing
//!
//! Command, disk and block share one 32-bit word. Construction is checked so
//! an oversized disk or block index can never spill into a neighbouring field.

use std::fmt;

use super::{
    BLOCK_FIELD_MAX, COMMAND_FIELD_MAX, COMMAND_SHIFT, DISK_FIELD_MAX, DISK_SHIFT,
};
use crate::error::{Error, Result};

/// Commands understood by the JBOD service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Bring the array online
    Mount,
    /// Take the array offline
    Unmount,
    /// Move the cursor to the disk in the disk field
    SeekToDisk,
    /// Move the cursor to the block in the block field
    SeekToBlock,
    /// Read the block under the cursor
    ReadBlock,
    /// Overwrite the block under the cursor
    WriteBlock,
}

impl Command {
    /// Wire code of the command
    pub fn code(self) -> u32 {
        match self {
            Command::Mount => 0,
            Command::Unmount => 1,
            Command::SeekToDisk => 2,
            Command::SeekToBlock => 3,
            Command::ReadBlock => 4,
            Command::WriteBlock => 5,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Command::Mount),
            1 => Ok(Command::Unmount),
            2 => Ok(Command::SeekToDisk),
            3 => Ok(Command::SeekToBlock),
            4 => Ok(Command::ReadBlock),
            5 => Ok(Command::WriteBlock),
            other => Err(Error::UnknownCommand(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Mount => "MOUNT",
            Command::Unmount => "UNMOUNT",
            Command::SeekToDisk => "SEEK_TO_DISK",
            Command::SeekToBlock => "SEEK_TO_BLOCK",
            Command::ReadBlock => "READ_BLOCK",
            Command::WriteBlock => "WRITE_BLOCK",
        };
        f.write_str(name)
    }
}

/// A packed JBOD instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(u32);

impl Opcode {
    /// Pack `command`, `disk` and `block`, rejecting values that do not fit
    /// their bit ranges.
    pub fn new(command: Command, disk: u32, block: u32) -> Result<Self> {
        if disk > DISK_FIELD_MAX {
            return Err(Error::FieldOutOfRange {
                field: "disk",
                value: disk,
                max: DISK_FIELD_MAX,
            });
        }
        if block > BLOCK_FIELD_MAX {
            return Err(Error::FieldOutOfRange {
                field: "block",
                value: block,
                max: BLOCK_FIELD_MAX,
            });
        }
        Ok(Self(
            (command.code() << COMMAND_SHIFT) | (disk << DISK_SHIFT) | block,
        ))
    }

    pub fn mount() -> Self {
        Self(Command::Mount.code() << COMMAND_SHIFT)
    }

    pub fn unmount() -> Self {
        Self(Command::Unmount.code() << COMMAND_SHIFT)
    }

    pub fn seek_to_disk(disk: u32) -> Result<Self> {
        Self::new(Command::SeekToDisk, disk, 0)
    }

    pub fn seek_to_block(block: u32) -> Result<Self> {
        Self::new(Command::SeekToBlock, 0, block)
    }

    pub fn read_block() -> Self {
        Self(Command::ReadBlock.code() << COMMAND_SHIFT)
    }

    pub fn write_block() -> Self {
        Self(Command::WriteBlock.code() << COMMAND_SHIFT)
    }

    /// Wrap a word received off the wire without interpreting it.
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Raw command field, valid or not
    #[inline]
    pub fn command_code(self) -> u32 {
        (self.0 >> COMMAND_SHIFT) & COMMAND_FIELD_MAX
    }

    pub fn command(self) -> Result<Command> {
        Command::try_from(self.command_code())
    }

    #[inline]
    pub fn disk(self) -> u32 {
        (self.0 >> DISK_SHIFT) & DISK_FIELD_MAX
    }

    #[inline]
    pub fn block(self) -> u32 {
        self.0 & BLOCK_FIELD_MAX
    }

    /// Whether a request with this opcode carries a trailing block
    #[inline]
    pub fn carries_block(self) -> bool {
        self.command_code() == Command::WriteBlock.code()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command() {
            Ok(command) => write!(f, "{}(disk={}, block={})", command, self.disk(), self.block()),
            Err(_) => write!(f, "{:#010x}", self.0),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
