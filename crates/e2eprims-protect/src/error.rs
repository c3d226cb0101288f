/// Errors outside the [`E2eResult`](crate::E2eResult) taxonomy.
///
/// These only report caller mistakes about buffer sizes; protocol outcomes
/// are always an `E2eResult`.
#[derive(Debug, thiserror::Error)]
pub enum ProtectError {
    /// The buffer handed to `protect` cannot hold a whole frame.
    #[error("buffer too small ({len} bytes, need {required})")]
    BufferTooSmall { len: usize, required: usize },

    /// The frame handed to `check` is not exactly one frame long.
    #[error("frame length mismatch ({len} bytes, expected {expected})")]
    FrameLength { len: usize, expected: usize },

    /// The payload does not match the configured data size.
    #[error("payload length mismatch ({len} bytes, expected {expected})")]
    PayloadLength { len: usize, expected: usize },

    /// A raw result code outside the known range.
    #[error("unknown result code {0}")]
    UnknownResult(u8),

    /// The operation needs a valid configuration and none is installed.
    #[error("protection is not configured")]
    NotConfigured,

    /// I/O error surfaced through the stream codec.
    #[cfg(feature = "async")]
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProtectError>;
