//! End-to-end protection for fixed-size periodic readings.
//!
//! A sender stamps every payload with a wrapping one-byte sequence counter and
//! a CRC-16; a receiver classifies each incoming frame as fresh, stale,
//! duplicated, gap-affected or corrupted. Overhead is three bytes per frame:
//!
//! ```text
//! ┌──────────────────────┬─────────────┬─────────────┬─────────────┐
//! │ Payload              │ Counter     │ CRC high    │ CRC low     │
//! │ (data_size bytes)    │ (1B)        │ (1B)        │ (1B)        │
//! └──────────────────────┴─────────────┴─────────────┴─────────────┘
//! ```
//!
//! The CRC covers payload and counter. State lives in caller-owned
//! [`Encoder`] and [`Decoder`] values, so any number of independent channel
//! pairs can coexist.

pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod protection;
pub mod result;

pub use checksum::{crc16, Checksum, Crc16};
#[cfg(feature = "async")]
pub use codec::{CheckedFrame, E2eCodec};
pub use config::{E2eConfig, OVERHEAD_SIZE};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{ProtectError, Result};
pub use protection::E2eProtection;
pub use result::E2eResult;
