use bytes::BytesMut;

use crate::checksum::{Checksum, Crc16};
use crate::config::E2eConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::result::E2eResult;

/// An encoder and a decoder configured together.
///
/// Convenient when one component both sends and receives on the same
/// logical channel, or in loopback tests. Use [`split`](Self::split) to hand
/// each half to a different owner.
#[derive(Debug, Clone)]
pub struct E2eProtection<C = Crc16> {
    encoder: Encoder<C>,
    decoder: Decoder<C>,
}

impl E2eProtection {
    /// Create an unconfigured pair using CRC-16/XMODEM.
    pub fn new() -> Self {
        Self::with_checksum(Crc16)
    }
}

impl Default for E2eProtection {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Checksum + Clone> E2eProtection<C> {
    /// Create an unconfigured pair with a custom checksum.
    pub fn with_checksum(checksum: C) -> Self {
        Self {
            encoder: Encoder::with_checksum(checksum.clone()),
            decoder: Decoder::with_checksum(checksum),
        }
    }
}

impl<C: Checksum> E2eProtection<C> {
    /// Configure both halves, resetting all sequence state.
    pub fn init(&mut self, config: Option<&E2eConfig>) -> E2eResult {
        let sent = self.encoder.init(config);
        let received = self.decoder.init(config);
        debug_assert_eq!(sent, received);
        sent
    }

    /// See [`Encoder::protect`].
    pub fn protect(&mut self, buffer: &mut [u8]) -> Result<E2eResult> {
        self.encoder.protect(buffer)
    }

    /// See [`Encoder::protect_payload`].
    pub fn protect_payload(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<E2eResult> {
        self.encoder.protect_payload(payload, dst)
    }

    /// See [`Decoder::check`].
    pub fn check(&mut self, frame: &[u8]) -> Result<E2eResult> {
        self.decoder.check(frame)
    }

    /// Frame size for buffer allocation, or 0 when unconfigured.
    pub fn result_frame_size(&self) -> usize {
        self.encoder.result_frame_size()
    }

    pub fn config(&self) -> Option<&E2eConfig> {
        self.encoder.config()
    }

    pub fn encoder(&self) -> &Encoder<C> {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder<C> {
        &self.decoder
    }

    /// Separate the two halves.
    pub fn split(self) -> (Encoder<C>, Decoder<C>) {
        (self.encoder, self.decoder)
    }
}
