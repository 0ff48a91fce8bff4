//! Frame Encoding and Decoding
//!
//! One [`Packet`] is one frame on the wire. Reads and writes go through
//! `read_exact`/`write_all`, so short reads and short writes are retried until
//! the whole frame has moved or the stream reports a real error.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{Block, Opcode, BLOCK_SIZE, FRAME_WITH_BLOCK_LEN, HEADER_LEN, STATUS_OK};
use crate::error::{Error, Result};

/// Decoded 8-byte frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub length: u16,
    pub opcode: u32,
    pub status: u16,
}

impl Header {
    /// Decode a header, accepting only the two frame lengths the protocol
    /// defines.
    pub fn decode(mut raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_LEN {
            return Err(Error::MalformedFrame(format!(
                "header needs {} bytes, got {}",
                HEADER_LEN,
                raw.len()
            )));
        }
        let header = Self {
            length: raw.get_u16(),
            opcode: raw.get_u32(),
            status: raw.get_u16(),
        };
        match header.length as usize {
            HEADER_LEN | FRAME_WITH_BLOCK_LEN => Ok(header),
            other => Err(Error::MalformedFrame(format!(
                "frame length {} is neither {} nor {}",
                other, HEADER_LEN, FRAME_WITH_BLOCK_LEN
            ))),
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.length);
        buf.put_u32(self.opcode);
        buf.put_u16(self.status);
    }

    /// Whether a block follows this header
    #[inline]
    pub fn has_block(&self) -> bool {
        self.length as usize > HEADER_LEN
    }
}

/// One protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub opcode: u32,
    pub status: u16,
    pub block: Option<Block>,
}

impl Packet {
    /// Build the request frame for `opcode`. The block travels only with
    /// `WRITE_BLOCK`; the status region of a request is always zero.
    pub fn request(opcode: Opcode, block: &Block) -> Self {
        Self {
            opcode: opcode.raw(),
            status: STATUS_OK,
            block: opcode.carries_block().then_some(*block),
        }
    }

    pub fn response(opcode: u32, status: u16, block: Option<Block>) -> Self {
        Self {
            opcode,
            status,
            block,
        }
    }

    /// Length field value of this frame
    pub fn length(&self) -> u16 {
        if self.block.is_some() {
            FRAME_WITH_BLOCK_LEN as u16
        } else {
            HEADER_LEN as u16
        }
    }

    pub fn header(&self) -> Header {
        Header {
            length: self.length(),
            opcode: self.opcode,
            status: self.status,
        }
    }

    /// Serialize the whole frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.length() as usize);
        self.header().encode(&mut buf);
        if let Some(block) = &self.block {
            buf.put_slice(block);
        }
        buf.freeze()
    }

    /// Write the whole frame to `writer`.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    /// Read exactly one frame from `reader`.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; HEADER_LEN];
        reader.read_exact(&mut raw)?;
        let header = Header::decode(&raw)?;

        let block = if header.has_block() {
            let mut block = [0u8; BLOCK_SIZE];
            reader.read_exact(&mut block)?;
            Some(block)
        } else {
            None
        };

        Ok(Self {
            opcode: header.opcode,
            status: header.status,
            block,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::STATUS_FAILED;
    use std::io::Cursor;

    fn make_block(fill: u8) -> Block {
        [fill; BLOCK_SIZE]
    }

    #[test]
    fn test_write_request_is_264_bytes() {
        let frame = Packet::request(Opcode::write_block(), &make_block(0xAB)).encode();
        assert_eq!(frame.len(), 264);
        assert_eq!(&frame[..2], &[0x01, 0x08]);
        assert_eq!(&frame[2..6], &(5u32 << 26).to_be_bytes());
        assert_eq!(&frame[6..8], &[0, 0]);
        assert!(frame[8..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_other_requests_are_8_bytes() {
        let block = make_block(0xFF);
        for opcode in [
            Opcode::mount(),
            Opcode::unmount(),
            Opcode::seek_to_disk(9).unwrap(),
            Opcode::seek_to_block(200).unwrap(),
            Opcode::read_block(),
        ] {
            let frame = Packet::request(opcode, &block).encode();
            assert_eq!(frame.len(), 8, "{}", opcode);
            assert_eq!(&frame[..2], &[0x00, 0x08]);
        }
    }

    #[test]
    fn test_header_is_big_endian() {
        let op = Opcode::seek_to_disk(1).unwrap();
        let frame = Packet::response(op.raw(), STATUS_FAILED, None).encode();
        assert_eq!(
            frame.as_ref(),
            &[0x00, 0x08, 0x08, 0x40, 0x00, 0x00, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_header_only_response_reads_no_block() {
        let mut wire = Packet::response(Opcode::mount().raw(), STATUS_OK, None)
            .encode()
            .to_vec();
        // Trailing bytes belong to the next frame and must stay unread.
        wire.extend_from_slice(&[0x42; 16]);
        let mut cursor = Cursor::new(wire);

        let packet = Packet::read_from(&mut cursor).unwrap();
        assert_eq!(packet.block, None);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_block_response_decodes() {
        let sent = Packet::response(Opcode::read_block().raw(), STATUS_OK, Some(make_block(7)));
        let mut cursor = Cursor::new(sent.encode().to_vec());
        let received = Packet::read_from(&mut cursor).unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn test_truncated_frame_fails() {
        let frame = Packet::response(Opcode::read_block().raw(), STATUS_OK, Some(make_block(1))).encode();
        let mut cursor = Cursor::new(frame[..100].to_vec());
        assert!(matches!(Packet::read_from(&mut cursor), Err(Error::Io(_))));

        let mut cursor = Cursor::new(vec![0u8; 5]);
        assert!(matches!(Packet::read_from(&mut cursor), Err(Error::Io(_))));
    }

    #[test]
    fn test_bad_length_is_malformed() {
        let mut raw = Vec::new();
        Header {
            length: 100,
            opcode: 0,
            status: 0,
        }
        .encode(&mut raw);
        assert!(matches!(
            Header::decode(&raw),
            Err(Error::MalformedFrame(_))
        ));
        assert!(matches!(Header::decode(&raw[..4]), Err(Error::MalformedFrame(_))));
    }
}
