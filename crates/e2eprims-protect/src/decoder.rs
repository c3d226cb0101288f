use tracing::{debug, trace};

use crate::checksum::{Checksum, Crc16};
use crate::config::E2eConfig;
use crate::error::{ProtectError, Result};
use crate::result::E2eResult;

/// Receiver-side state: classifies incoming frames.
///
/// Tracks the last accepted counter and whether a valid frame has been seen
/// since `init`. See [`check`](Decoder::check) for the decision table.
#[derive(Debug, Clone)]
pub struct Decoder<C = Crc16> {
    config: Option<E2eConfig>,
    last_accepted: u8,
    awaiting_first_frame: bool,
    checksum: C,
}

impl Decoder {
    /// Create an unconfigured decoder using CRC-16/XMODEM.
    pub fn new() -> Self {
        Self::with_checksum(Crc16)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Checksum> Decoder<C> {
    /// Create an unconfigured decoder with a custom checksum.
    pub fn with_checksum(checksum: C) -> Self {
        Self {
            config: None,
            last_accepted: 0,
            awaiting_first_frame: true,
            checksum,
        }
    }

    /// Install a copy of `config`, reset the counter and wait for a first frame again.
    pub fn init(&mut self, config: Option<&E2eConfig>) -> E2eResult {
        self.last_accepted = 0;
        self.awaiting_first_frame = true;
        self.config = E2eConfig::accept(config);
        match self.config {
            Some(config) => {
                debug!(?config, "decoder configured");
                E2eResult::Ok
            }
            None => {
                debug!(?config, "decoder config rejected");
                E2eResult::NoConfiguration
            }
        }
    }

    /// Classify one frame.
    ///
    /// The last accepted counter moves on every call: to the received
    /// counter when the CRC matches, otherwise one step forward, so a single
    /// corrupted frame cannot desynchronise the receiver. Then, first match
    /// wins:
    ///
    /// | condition                      | result          |
    /// |--------------------------------|-----------------|
    /// | CRC mismatch                   | `WrongCrc`      |
    /// | first valid frame since `init` | `Initial`       |
    /// | diff == 0                      | `Repetition`    |
    /// | diff > `max_seq_diff`          | `OutOfSequence` |
    /// | diff != 1                      | `OkSomeLost`    |
    /// | otherwise                      | `Ok`            |
    ///
    /// `diff` is the received counter minus the previously accepted one,
    /// modulo 256.
    pub fn check(&mut self, frame: &[u8]) -> Result<E2eResult> {
        let Some(config) = self.config else {
            return Ok(E2eResult::NoConfiguration);
        };

        let data_size = usize::from(config.data_size);
        let expected = config.frame_size();
        if frame.len() != expected {
            return Err(ProtectError::FrameLength {
                len: frame.len(),
                expected,
            });
        }

        let received = frame[data_size];
        let crc_received = u16::from_be_bytes([frame[data_size + 1], frame[data_size + 2]]);
        let crc_computed = self.checksum.checksum(&frame[..=data_size]);
        let crc_ok = crc_received == crc_computed;
        let seq_diff = received.wrapping_sub(self.last_accepted);

        self.last_accepted = if crc_ok {
            received
        } else {
            self.last_accepted.wrapping_add(1)
        };

        let result = if !crc_ok {
            E2eResult::WrongCrc
        } else if self.awaiting_first_frame {
            self.awaiting_first_frame = false;
            E2eResult::Initial
        } else if seq_diff == 0 {
            E2eResult::Repetition
        } else if seq_diff > config.max_seq_diff {
            E2eResult::OutOfSequence
        } else if seq_diff != 1 {
            E2eResult::OkSomeLost
        } else {
            E2eResult::Ok
        };

        if result == E2eResult::Ok {
            trace!(counter = received, "frame accepted");
        } else {
            debug!(
                counter = received,
                seq_diff,
                crc_received,
                crc_computed,
                result = result.as_str(),
                "frame classified"
            );
        }

        Ok(result)
    }

    /// Frame size for buffer allocation, or 0 when unconfigured.
    pub fn result_frame_size(&self) -> usize {
        self.config.map_or(0, |config| config.frame_size())
    }

    /// The installed configuration.
    pub fn config(&self) -> Option<&E2eConfig> {
        self.config.as_ref()
    }

    /// Counter the next frame is compared against.
    pub fn last_accepted_counter(&self) -> u8 {
        self.last_accepted
    }

    /// Returns true until the first frame with a valid CRC arrives.
    pub fn is_awaiting_first_frame(&self) -> bool {
        self.awaiting_first_frame
    }
}
