use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::checksum::{Checksum, Crc16};
use crate::config::{E2eConfig, OVERHEAD_SIZE};
use crate::error::{ProtectError, Result};
use crate::result::E2eResult;

/// Sender-side state: stamps payloads with a counter and a CRC.
///
/// Starts unconfigured. Each call to [`protect`](Encoder::protect) advances
/// the counter by one, wrapping at 256, so the first frame carries counter 1.
#[derive(Debug, Clone)]
pub struct Encoder<C = Crc16> {
    config: Option<E2eConfig>,
    send_counter: u8,
    checksum: C,
}

impl Encoder {
    /// Create an unconfigured encoder using CRC-16/XMODEM.
    pub fn new() -> Self {
        Self::with_checksum(Crc16)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Checksum> Encoder<C> {
    /// Create an unconfigured encoder with a custom checksum.
    pub fn with_checksum(checksum: C) -> Self {
        Self {
            config: None,
            send_counter: 0,
            checksum,
        }
    }

    /// Install a copy of `config` and reset the counter.
    ///
    /// An absent or invalid config leaves the encoder unconfigured and
    /// returns [`E2eResult::NoConfiguration`].
    pub fn init(&mut self, config: Option<&E2eConfig>) -> E2eResult {
        self.send_counter = 0;
        self.config = E2eConfig::accept(config);
        match self.config {
            Some(config) => {
                debug!(?config, "encoder configured");
                E2eResult::Ok
            }
            None => {
                debug!(?config, "encoder config rejected");
                E2eResult::NoConfiguration
            }
        }
    }

    /// Protect a frame in place.
    ///
    /// The first `data_size` bytes of `buffer` must already hold the
    /// payload; counter and CRC are written right after it. Extra capacity
    /// beyond one frame is left untouched.
    pub fn protect(&mut self, buffer: &mut [u8]) -> Result<E2eResult> {
        let Some(config) = self.config else {
            return Ok(E2eResult::NoConfiguration);
        };

        let data_size = usize::from(config.data_size);
        let required = config.frame_size();
        if buffer.len() < required {
            return Err(ProtectError::BufferTooSmall {
                len: buffer.len(),
                required,
            });
        }

        self.send_counter = self.send_counter.wrapping_add(1);
        buffer[data_size] = self.send_counter;
        let crc = self.checksum.checksum(&buffer[..=data_size]);
        buffer[data_size + 1..required].copy_from_slice(&crc.to_be_bytes());

        trace!(counter = self.send_counter, crc, "protected frame");
        Ok(E2eResult::Ok)
    }

    /// Append a protected frame for `payload` to `dst`.
    pub fn protect_payload(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<E2eResult> {
        let Some(config) = self.config else {
            return Ok(E2eResult::NoConfiguration);
        };

        let expected = usize::from(config.data_size);
        if payload.len() != expected {
            return Err(ProtectError::PayloadLength {
                len: payload.len(),
                expected,
            });
        }

        let start = dst.len();
        dst.reserve(config.frame_size());
        dst.put_slice(payload);
        dst.put_bytes(0, OVERHEAD_SIZE);
        self.protect(&mut dst[start..])
    }

    /// Frame size for buffer allocation, or 0 when unconfigured.
    pub fn result_frame_size(&self) -> usize {
        self.config.map_or(0, |config| config.frame_size())
    }

    /// The installed configuration.
    pub fn config(&self) -> Option<&E2eConfig> {
        self.config.as_ref()
    }

    /// Counter stamped on the most recent frame (0 before the first).
    pub fn counter(&self) -> u8 {
        self.send_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::crc16;

    fn configured(max_seq_diff: u8, data_size: u8) -> Encoder {
        let mut encoder = Encoder::new();
        assert_eq!(
            encoder.init(Some(&E2eConfig::new(max_seq_diff, data_size))),
            E2eResult::Ok
        );
        encoder
    }

    #[test]
    fn unconfigured_encoder_leaves_buffer_alone() {
        let mut encoder = Encoder::new();
        let mut buffer = [1u8, 2, 3, 4, 5];

        assert_eq!(
            encoder.protect(&mut buffer).unwrap(),
            E2eResult::NoConfiguration
        );
        assert_eq!(buffer, [1, 2, 3, 4, 5]);
        assert_eq!(encoder.result_frame_size(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut encoder = Encoder::new();
        assert_eq!(encoder.init(None), E2eResult::NoConfiguration);
        assert_eq!(
            encoder.init(Some(&E2eConfig::new(0, 2))),
            E2eResult::NoConfiguration
        );
        assert_eq!(
            encoder.init(Some(&E2eConfig::new(2, 0))),
            E2eResult::NoConfiguration
        );
        assert!(encoder.config().is_none());
    }

    #[test]
    fn protect_writes_counter_and_big_endian_crc() {
        let mut encoder = configured(2, 2);
        let mut buffer = [85u8, 170, 0, 0, 0];

        assert_eq!(encoder.protect(&mut buffer).unwrap(), E2eResult::Ok);

        let crc = crc16(&[85, 170, 1]);
        assert_eq!(buffer, [85, 170, 1, (crc >> 8) as u8, (crc & 0xFF) as u8]);
    }

    #[test]
    fn counters_advance_and_wrap() {
        let mut encoder = configured(1, 1);
        let mut counters = Vec::new();
        for _ in 0..257 {
            let mut buffer = [0u8; 4];
            encoder.protect(&mut buffer).unwrap();
            counters.push(buffer[1]);
        }

        assert_eq!(counters[0], 1);
        assert_eq!(counters[254], 255);
        assert_eq!(counters[255], 0);
        assert_eq!(counters[256], 1);
    }

    #[test]
    fn short_buffer_is_an_error_and_keeps_counter() {
        let mut encoder = configured(2, 2);
        let mut buffer = [0u8; 4];

        assert!(matches!(
            encoder.protect(&mut buffer),
            Err(ProtectError::BufferTooSmall {
                len: 4,
                required: 5
            })
        ));
        assert_eq!(encoder.counter(), 0);
    }

    #[test]
    fn extra_capacity_is_untouched() {
        let mut encoder = configured(2, 2);
        let mut buffer = [85u8, 170, 0, 0, 0, 0xAA, 0xBB];

        encoder.protect(&mut buffer).unwrap();
        assert_eq!(&buffer[5..], &[0xAA, 0xBB]);
    }

    #[test]
    fn reinit_resets_counter() {
        let mut encoder = configured(2, 2);
        let mut buffer = [0u8; 5];
        encoder.protect(&mut buffer).unwrap();
        encoder.protect(&mut buffer).unwrap();
        assert_eq!(encoder.counter(), 2);

        encoder.init(Some(&E2eConfig::new(2, 2)));
        encoder.protect(&mut buffer).unwrap();
        assert_eq!(buffer[2], 1);
    }

    #[test]
    fn protect_payload_appends_frames() {
        let mut encoder = configured(2, 2);
        let mut dst = BytesMut::new();

        encoder.protect_payload(&[1, 2], &mut dst).unwrap();
        encoder.protect_payload(&[3, 4], &mut dst).unwrap();

        assert_eq!(dst.len(), 10);
        assert_eq!(&dst[..3], &[1, 2, 1]);
        assert_eq!(&dst[5..8], &[3, 4, 2]);
    }

    #[test]
    fn protect_payload_checks_length() {
        let mut encoder = configured(2, 2);
        let mut dst = BytesMut::new();

        assert!(matches!(
            encoder.protect_payload(&[1, 2, 3], &mut dst),
            Err(ProtectError::PayloadLength {
                len: 3,
                expected: 2
            })
        ));
        assert!(dst.is_empty());
    }

    #[test]
    fn custom_checksum_is_used() {
        let mut encoder = Encoder::with_checksum(|_: &[u8]| -> u16 { 0x1234 });
        encoder.init(Some(&E2eConfig::new(1, 1)));
        let mut buffer = [9u8, 0, 0, 0];

        encoder.protect(&mut buffer).unwrap();
        assert_eq!(buffer, [9, 1, 0x12, 0x34]);
    }
}
