//! Array Controller
//!
//! Presents the remote JBOD array as a single linear volume.
//!
//! # Architecture
//!
//! ```text
//! read(address, buf) / write(address, data)
//!        │
//!        ▼
//! ┌──────────────┐  per block  ┌──────────────┐  hit
//! │   Segments   │────────────▶│  BlockCache  │──────▶ copy out / splice in
//! │ (translate + │             └──────┬───────┘               ▲
//! │    split)    │                miss│                       │
//! └──────────────┘                    ▼                       │
//!                             ┌────────────────┐              │
//!                             │ BlockTransport │──────────────┘
//!                             │ seek/read/write│
//!                             └────────────────┘
//! ```
//!
//! # Consistency
//!
//! A controller is the only client of its array, so the cache is treated as
//! authoritative: a cached block is never re-read before being merged, and
//! every written block goes to the array and the cache together.
//!
//! A transport failure aborts the request without a partial byte count and
//! forgets the remote cursor, so the next request starts with a fresh seek.

mod address;
mod controller;

pub use address::{BlockAddress, Segment, Segments};
pub use controller::ArrayController;
