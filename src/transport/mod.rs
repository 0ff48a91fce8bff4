//! JBOD Transport
//!
//! The controller talks to the array only through [`BlockTransport`]: one
//! opcode out, one status back, with the 256-byte block buffer carried in the
//! direction the command requires. [`JbodConnection`] is the network
//! implementation; the in-memory mock array implements it as well.

mod connection;

pub use connection::JbodConnection;

use crate::error::Result;
use crate::protocol::{Block, Opcode};

/// Request/response access to a JBOD array.
pub trait BlockTransport {
    /// Perform one operation and return the array's status word.
    ///
    /// `block` is sent with `WRITE_BLOCK` requests and overwritten by the
    /// block carried in a `READ_BLOCK` response. Errors mean the exchange
    /// itself failed; a rejected operation is a non-zero status.
    fn execute(&mut self, opcode: Opcode, block: &mut Block) -> Result<u16>;
}

impl<T: BlockTransport + ?Sized> BlockTransport for &mut T {
    fn execute(&mut self, opcode: Opcode, block: &mut Block) -> Result<u16> {
        (**self).execute(opcode, block)
    }
}

impl<T: BlockTransport + ?Sized> BlockTransport for Box<T> {
    fn execute(&mut self, opcode: Opcode, block: &mut Block) -> Result<u16> {
        (**self).execute(opcode, block)
    }
}
