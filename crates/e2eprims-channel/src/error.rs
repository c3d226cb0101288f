/// Errors raised when configuring fault injection.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A bit-flip fault names a bit outside a byte.
    #[error("bit index {0} out of range (expected 0-7)")]
    InvalidBit(u8),

    /// A chaos probability lies outside `[0, 1]`.
    #[error("{name} probability {value} outside [0, 1]")]
    InvalidRate { name: &'static str, value: f64 },

    /// A periodic trigger was given a zero period.
    #[error("trigger period must be greater than zero")]
    ZeroPeriod,

    /// A fault plan was given a zero duration.
    #[error("fault duration must be greater than zero")]
    ZeroDuration,

    /// A fault plan carries no faults.
    #[error("fault plan for {0} contains no faults")]
    EmptyPlan(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
