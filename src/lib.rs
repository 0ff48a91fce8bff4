//! JBOD Array Controller
//!
//! Presents a set of fixed-size disks, reachable only through a remote JBOD
//! service, as one linear byte-addressable volume with a block cache in front.
//!
//! # Architecture
//!
//! ```text
//! ArrayController → BlockCache
//!        │
//!        └────────→ BlockTransport → JBOD wire protocol → remote array
//! ```
//!
//! # Example
//!
//! ```no_run
//! use jbod_array::{ArrayController, ClientConfig};
//!
//! # fn example() -> jbod_array::Result<()> {
//! let config = ClientConfig {
//!     cache_entries: Some(256),
//!     ..ClientConfig::default()
//! };
//! let mut array = ArrayController::connect(&config)?;
//! array.mount()?;
//!
//! array.write(1000, b"hello")?;
//! let data = array.read_vec(1000, 5)?;
//! assert_eq!(data, b"hello");
//!
//! array.report_hit_rate();
//! array.unmount()?;
//! array.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`array`] - Address translation, request splitting and the controller
//! - [`cache`] - Fixed-capacity block cache
//! - [`config`] - Array geometry and client settings
//! - [`error`] - Error types
//! - [`protocol`] - Opcode packing and frame codec
//! - [`transport`] - Request/response transport over a byte stream
//! - [`mock`] - In-memory array and loopback server (feature-gated)

pub mod array;
pub mod cache;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

// Mock array (feature-gated)
#[cfg(any(test, feature = "mock-jbod"))]
pub mod mock;

// Re-export commonly used types
pub use array::ArrayController;
pub use cache::{BlockCache, BlockKey, CacheStats, InsertOutcome};
pub use config::{ArrayGeometry, ClientConfig};
pub use error::{Error, Result};
pub use protocol::{Command, Opcode};
pub use transport::{BlockTransport, JbodConnection};
