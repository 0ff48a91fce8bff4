//! Error types for the JBOD array controller

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the JBOD array
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Request Preconditions
    // =========================================================================
    /// Array I/O attempted while unmounted
    #[error("array is not mounted")]
    NotMounted,

    /// Mount attempted while already mounted
    #[error("array is already mounted")]
    AlreadyMounted,

    /// Request longer than a single I/O may be
    #[error("request of {len} bytes exceeds the {max} byte limit")]
    RequestTooLarge { len: usize, max: usize },

    /// Request runs past the end of the linear volume
    #[error("request [{address}, {address}+{len}) exceeds volume capacity {capacity}")]
    OutOfBounds {
        address: u64,
        len: usize,
        capacity: u64,
    },

    // =========================================================================
    // Block Cache Errors
    // =========================================================================
    /// Cache create called while a cache exists
    #[error("block cache is already enabled")]
    CacheAlreadyEnabled,

    /// Cache operation called without a cache
    #[error("block cache is not enabled")]
    CacheNotEnabled,

    /// Cache capacity outside the accepted range
    #[error("invalid cache capacity {capacity}: must be within [{min}, {max}]")]
    InvalidCacheCapacity {
        capacity: usize,
        min: usize,
        max: usize,
    },

    /// Lookup before the first insertion
    #[error("block cache has not been populated yet")]
    CacheCold,

    /// Cache key outside the array geometry
    #[error("cache key (disk {disk}, block {block}) is outside the array geometry")]
    CacheKeyOutOfRange { disk: u32, block: u32 },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Opcode field does not fit in its bit range
    #[error("opcode field {field} value {value} exceeds maximum {max}")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Command code not part of the protocol
    #[error("unknown JBOD command code {0}")]
    UnknownCommand(u32),

    /// Frame header that cannot be decoded
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Response echoed a different opcode than the request carried
    #[error("response opcode {received:#010x} does not match request {sent:#010x}")]
    OpcodeMismatch { sent: u32, received: u32 },

    /// Remote array rejected an operation
    #[error("remote array returned status {status:#06x} for opcode {opcode:#010x}")]
    RemoteStatus { opcode: u32, status: u16 },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be established
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
