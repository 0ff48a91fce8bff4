//! Byte-Stream Connection to a JBOD Service
//!
//! Blocking and strictly sequential: each call writes one request frame and
//! waits for its response. There is no reconnect, retry or timeout here; a
//! failed exchange leaves the remote cursor in an unknown position.

use std::io::{Read, Write};
use std::net::TcpStream;

use tracing::{debug, info};

use super::BlockTransport;
use crate::error::{Error, Result};
use crate::protocol::{Block, Command, Opcode, Packet, STATUS_OK};

/// Connection to a JBOD service over any byte stream
pub struct JbodConnection<S = TcpStream> {
    stream: S,
}

impl JbodConnection<TcpStream> {
    /// Open a TCP connection to the service at `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect((host, port)).map_err(|source| Error::Connect {
            addr: addr.clone(),
            source,
        })?;
        // Frames are tiny and strictly request/response.
        stream.set_nodelay(true)?;
        info!("Connected to JBOD service at {}", addr);
        Ok(Self { stream })
    }

    /// Close the connection.
    pub fn disconnect(self) {
        if let Ok(peer) = self.stream.peer_addr() {
            info!("Disconnecting from JBOD service at {}", peer);
        }
        drop(self.stream);
    }
}

impl<S: Read + Write> JbodConnection<S> {
    /// Wrap an already-open stream.
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> BlockTransport for JbodConnection<S> {
    fn execute(&mut self, opcode: Opcode, block: &mut Block) -> Result<u16> {
        Packet::request(opcode, block).write_to(&mut self.stream)?;

        let response = Packet::read_from(&mut self.stream)?;
        if response.opcode != opcode.raw() {
            return Err(Error::OpcodeMismatch {
                sent: opcode.raw(),
                received: response.opcode,
            });
        }
        match response.block {
            Some(data) => *block = data,
            None if opcode.command_code() == Command::ReadBlock.code()
                && response.status == STATUS_OK =>
            {
                return Err(Error::MalformedFrame(format!(
                    "successful {} response carried no block",
                    opcode
                )));
            }
            None => {}
        }

        debug!(%opcode, status = response.status, "JBOD operation complete");
        Ok(response.status)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BLOCK_SIZE, STATUS_FAILED};
    use std::io::{self, Cursor};

    /// Stream that replays canned response bytes and records what was sent.
    /// Writes are accepted a few bytes at a time to exercise short writes.
    struct ScriptedStream {
        incoming: Cursor<Vec<u8>>,
        outgoing: Vec<u8>,
    }

    impl ScriptedStream {
        fn new(responses: &[Packet]) -> Self {
            let bytes = responses.iter().flat_map(|p| p.encode().to_vec()).collect();
            Self {
                incoming: Cursor::new(bytes),
                outgoing: Vec::new(),
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            // Dribble one byte at a time to exercise short reads.
            let len = buf.len().min(1);
            self.incoming.read(&mut buf[..len])
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let len = buf.len().min(7);
            self.outgoing.extend_from_slice(&buf[..len]);
            Ok(len)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_block_exchange() {
        let op = Opcode::write_block();
        let stream = ScriptedStream::new(&[Packet::response(op.raw(), STATUS_OK, None)]);
        let mut conn = JbodConnection::from_stream(stream);

        let mut block = [0x3C; BLOCK_SIZE];
        assert_eq!(conn.execute(op, &mut block).unwrap(), STATUS_OK);
        assert_eq!(conn.get_ref().outgoing.len(), 264);
        assert_eq!(block, [0x3C; BLOCK_SIZE]);
    }

    #[test]
    fn test_read_block_fills_buffer() {
        let op = Opcode::read_block();
        let stream =
            ScriptedStream::new(&[Packet::response(op.raw(), STATUS_OK, Some([0x77; BLOCK_SIZE]))]);
        let mut conn = JbodConnection::from_stream(stream);

        let mut block = [0u8; BLOCK_SIZE];
        conn.execute(op, &mut block).unwrap();
        assert_eq!(block, [0x77; BLOCK_SIZE]);
        assert_eq!(conn.into_inner().outgoing.len(), 8);
    }

    #[test]
    fn test_read_block_without_block_is_malformed() {
        let op = Opcode::read_block();
        let stream = ScriptedStream::new(&[Packet::response(op.raw(), STATUS_OK, None)]);
        let mut conn = JbodConnection::from_stream(stream);

        let mut block = [0u8; BLOCK_SIZE];
        let result = conn.execute(op, &mut block);
        assert!(matches!(result, Err(Error::MalformedFrame(_))));
    }

    #[test]
    fn test_failed_read_block_needs_no_block() {
        let op = Opcode::read_block();
        let stream = ScriptedStream::new(&[Packet::response(op.raw(), STATUS_FAILED, None)]);
        let mut conn = JbodConnection::from_stream(stream);
        assert_eq!(conn.execute(op, &mut [0u8; BLOCK_SIZE]).unwrap(), STATUS_FAILED);
    }

    #[test]
    fn test_status_is_returned() {
        let op = Opcode::mount();
        let stream = ScriptedStream::new(&[Packet::response(op.raw(), 0xFFFF, None)]);
        let mut conn = JbodConnection::from_stream(stream);
        assert_eq!(conn.execute(op, &mut [0u8; BLOCK_SIZE]).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_opcode_mismatch() {
        let stream = ScriptedStream::new(&[Packet::response(Opcode::unmount().raw(), STATUS_OK, None)]);
        let mut conn = JbodConnection::from_stream(stream);
        let result = conn.execute(Opcode::mount(), &mut [0u8; BLOCK_SIZE]);
        assert!(matches!(result, Err(Error::OpcodeMismatch { .. })));
    }

    #[test]
    fn test_closed_stream_fails() {
        let mut conn = JbodConnection::from_stream(ScriptedStream::new(&[]));
        let result = conn.execute(Opcode::mount(), &mut [0u8; BLOCK_SIZE]);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_connect_refused_reports_reason() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        match JbodConnection::connect("127.0.0.1", port) {
            Err(Error::Connect { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{}", port)),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connection to a closed port succeeded"),
        }
    }
}
