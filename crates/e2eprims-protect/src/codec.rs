//! Stream codec for protected frames.
//!
//! Frames have a fixed size, so decoding needs no length prefix: the codec
//! waits for `frame_size` bytes and classifies them.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder as StreamDecoder, Encoder as StreamEncoder};

use crate::checksum::{Checksum, Crc16};
use crate::config::{E2eConfig, OVERHEAD_SIZE};
use crate::error::{ProtectError, Result};
use crate::protection::E2eProtection;
use crate::result::E2eResult;

/// A classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFrame {
    pub result: E2eResult,
    /// Counter byte as received, possibly corrupted when `result` is `WrongCrc`.
    pub counter: u8,
    pub payload: Bytes,
}

/// `tokio_util` codec: encodes payloads into protected frames and decodes
/// byte streams into [`CheckedFrame`]s.
#[derive(Debug, Clone)]
pub struct E2eCodec<C = Crc16> {
    protection: E2eProtection<C>,
}

impl E2eCodec {
    /// Create a codec using CRC-16/XMODEM.
    pub fn new(config: &E2eConfig) -> Result<Self> {
        Self::with_checksum(config, Crc16)
    }
}

impl<C: Checksum + Clone> E2eCodec<C> {
    /// Create a codec with a custom checksum.
    pub fn with_checksum(config: &E2eConfig, checksum: C) -> Result<Self> {
        let mut protection = E2eProtection::with_checksum(checksum);
        match protection.init(Some(config)) {
            E2eResult::Ok => Ok(Self { protection }),
            _ => Err(ProtectError::NotConfigured),
        }
    }
}

impl<C: Checksum> E2eCodec<C> {
    pub fn frame_size(&self) -> usize {
        self.protection.result_frame_size()
    }

    pub fn protection(&self) -> &E2eProtection<C> {
        &self.protection
    }
}

impl<C: Checksum> StreamDecoder for E2eCodec<C> {
    type Item = CheckedFrame;
    type Error = ProtectError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<CheckedFrame>> {
        let frame_size = self.frame_size();
        if frame_size == 0 {
            return Err(ProtectError::NotConfigured);
        }
        if src.len() < frame_size {
            src.reserve(frame_size - src.len());
            return Ok(None);
        }

        let frame = src.split_to(frame_size).freeze();
        let result = self.protection.check(&frame)?;
        let data_size = frame_size - OVERHEAD_SIZE;

        Ok(Some(CheckedFrame {
            result,
            counter: frame[data_size],
            payload: frame.slice(..data_size),
        }))
    }
}

impl<'a, C: Checksum> StreamEncoder<&'a [u8]> for E2eCodec<C> {
    type Error = ProtectError;

    fn encode(&mut self, payload: &'a [u8], dst: &mut BytesMut) -> Result<()> {
        match self.protection.protect_payload(payload, dst)? {
            E2eResult::Ok => Ok(()),
            _ => Err(ProtectError::NotConfigured),
        }
    }
}
