use serde::{Deserialize, Serialize};

/// Bytes appended to every payload: counter (1) + CRC (2).
pub const OVERHEAD_SIZE: usize = 3;

/// Protection parameters shared by a sender and its receiver.
///
/// Both fields must be non-zero. Encoders and decoders keep their own copy,
/// so changing the caller's value after `init` has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct E2eConfig {
    /// Largest counter gap still accepted as `OkSomeLost`.
    pub max_seq_diff: u8,
    /// Payload length in bytes.
    pub data_size: u8,
}

impl E2eConfig {
    pub const fn new(max_seq_diff: u8, data_size: u8) -> Self {
        Self {
            max_seq_diff,
            data_size,
        }
    }

    /// Returns true if both fields are non-zero.
    pub fn is_valid(&self) -> bool {
        self.max_seq_diff > 0 && self.data_size > 0
    }

    /// Total wire size of one frame.
    pub fn frame_size(&self) -> usize {
        usize::from(self.data_size) + OVERHEAD_SIZE
    }

    /// Keep `config` only if it is present and valid.
    pub(crate) fn accept(config: Option<&E2eConfig>) -> Option<E2eConfig> {
        config.filter(|config| config.is_valid()).copied()
    }
}
