//! Loopback JBOD Server
//!
//! Serves a [`MockJbod`] over TCP with the real wire protocol, one thread per
//! connection. All connections share the same array.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::MockJbod;
use crate::error::{Error, Result};
use crate::protocol::{Command, Opcode, Packet, BLOCK_SIZE, STATUS_OK};

/// Background TCP server exposing a mock array
pub struct MockJbodServer {
    addr: SocketAddr,
    array: Arc<Mutex<MockJbod>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockJbodServer {
    /// Serve `array` on an ephemeral loopback port.
    pub fn start(array: MockJbod) -> Result<Self> {
        Self::bind("127.0.0.1:0", array)
    }

    /// Serve `array` on `addr`.
    pub fn bind(addr: &str, array: MockJbod) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| Error::Connect {
            addr: addr.to_string(),
            source,
        })?;
        let addr = listener.local_addr()?;
        let array = Arc::new(Mutex::new(array));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let array = Arc::clone(&array);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("mock-jbod-accept".to_string())
                .spawn(move || accept_loop(listener, array, shutdown))?
        };

        info!("Mock JBOD server listening on {}", addr);
        Ok(Self {
            addr,
            array,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Shared handle to the served array
    pub fn array(&self) -> Arc<Mutex<MockJbod>> {
        Arc::clone(&self.array)
    }

    /// Block until the accept loop ends.
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockJbodServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            // Wake the blocking accept so it can observe the flag.
            let _ = TcpStream::connect(self.addr);
            let _ = handle.join();
        }
    }
}

fn accept_loop(listener: TcpListener, array: Arc<Mutex<MockJbod>>, shutdown: Arc<AtomicBool>) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let array = Arc::clone(&array);
                let spawned = thread::Builder::new()
                    .name("mock-jbod-conn".to_string())
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, array) {
                            warn!("Mock JBOD connection error: {}", e);
                        }
                    });
                if let Err(e) = spawned {
                    warn!("Failed to spawn mock JBOD connection thread: {}", e);
                }
            }
            Err(e) => warn!("Mock JBOD accept error: {}", e),
        }
    }
    debug!("Mock JBOD accept loop stopped");
}

fn serve_connection(mut stream: TcpStream, array: Arc<Mutex<MockJbod>>) -> Result<()> {
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;
    debug!("Mock JBOD client connected from {}", peer);

    loop {
        let request = match Packet::read_from(&mut stream) {
            Ok(request) => request,
            Err(Error::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("Mock JBOD client {} disconnected", peer);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let opcode = Opcode::from_raw(request.opcode);
        let mut block = request.block.unwrap_or([0u8; BLOCK_SIZE]);
        let status = array.lock().handle(opcode, &mut block);

        let payload = (opcode.command_code() == Command::ReadBlock.code() && status == STATUS_OK)
            .then_some(block);
        Packet::response(request.opcode, status, payload).write_to(&mut stream)?;
    }
}

// =============================================================================
// Tests
// =============================================================================
