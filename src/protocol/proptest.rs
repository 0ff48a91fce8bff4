//! Property-Based Tests for the Wire Protocol
//!
//! # Test Properties
//!
//! 1. **Opcode Fields**: packing then unpacking returns command, disk and block
//! 2. **Field Isolation**: no in-range value leaks into a neighbouring field
//! 3. **Frame Length**: only `WRITE_BLOCK` requests carry a block
//! 4. **Frame Decoding**: any encoded frame decodes to itself

#![cfg(test)]

use std::io::Cursor;

use proptest::prelude::*;

use super::{
    Block, Command, Opcode, Packet, BLOCK_FIELD_MAX, BLOCK_SIZE, DISK_FIELD_MAX,
    FRAME_WITH_BLOCK_LEN, HEADER_LEN,
};

// =============================================================================
// Property Strategies
// =============================================================================

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Mount),
        Just(Command::Unmount),
        Just(Command::SeekToDisk),
        Just(Command::SeekToBlock),
        Just(Command::ReadBlock),
        Just(Command::WriteBlock),
    ]
}

fn block_strategy() -> impl Strategy<Value = Block> {
    prop::collection::vec(any::<u8>(), BLOCK_SIZE).prop_map(|v| {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&v);
        block
    })
}

// =============================================================================
// Opcode Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: every in-range triple survives packing.
    #[test]
    fn prop_opcode_fields_roundtrip(
        command in command_strategy(),
        disk in 0u32..=DISK_FIELD_MAX,
        block in 0u32..=BLOCK_FIELD_MAX,
    ) {
        let op = Opcode::new(command, disk, block)?;
        prop_assert_eq!(op.command()?, command);
        prop_assert_eq!(op.disk(), disk);
        prop_assert_eq!(op.block(), block);
    }

    /// Property: out-of-range disks are rejected instead of corrupting the
    /// command field.
    #[test]
    fn prop_opcode_rejects_wide_disk(disk in (DISK_FIELD_MAX + 1)..=u32::MAX) {
        prop_assert!(Opcode::new(Command::SeekToDisk, disk, 0).is_err());
    }

    /// Property: out-of-range blocks are rejected instead of corrupting the
    /// disk field.
    #[test]
    fn prop_opcode_rejects_wide_block(block in (BLOCK_FIELD_MAX + 1)..=u32::MAX) {
        prop_assert!(Opcode::new(Command::SeekToBlock, 0, block).is_err());
    }
}

// =============================================================================
// Framing Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: request length depends only on the command.
    #[test]
    fn prop_request_length(
        command in command_strategy(),
        disk in 0u32..=DISK_FIELD_MAX,
        block_id in 0u32..=BLOCK_FIELD_MAX,
        data in block_strategy(),
    ) {
        let op = Opcode::new(command, disk, block_id)?;
        let frame = Packet::request(op, &data).encode();
        if command == Command::WriteBlock {
            prop_assert_eq!(frame.len(), FRAME_WITH_BLOCK_LEN);
            prop_assert_eq!(&frame[HEADER_LEN..], &data[..]);
        } else {
            prop_assert_eq!(frame.len(), HEADER_LEN);
        }
        prop_assert_eq!(&frame[2..6], &op.raw().to_be_bytes()[..]);
    }

    /// Property: responses decode to exactly what was encoded.
    #[test]
    fn prop_response_decodes(
        opcode in any::<u32>(),
        status in any::<u16>(),
        block in prop::option::of(block_strategy()),
    ) {
        let packet = Packet::response(opcode, status, block);
        let mut cursor = Cursor::new(packet.encode().to_vec());
        let decoded = Packet::read_from(&mut cursor)?;
        prop_assert_eq!(decoded, packet);
    }
}
