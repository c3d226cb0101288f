use std::fmt;

use e2eprims::campaign::CampaignError;
use e2eprims::channel::ChannelError;
use e2eprims::protect::ProtectError;

pub const SUCCESS: i32 = 0;
#[allow(dead_code)]
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

pub fn protect_error(context: &str, err: ProtectError) -> CliError {
    match err {
        ProtectError::PayloadLength { .. } | ProtectError::NotConfigured => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ProtectError::FrameLength { .. } | ProtectError::UnknownResult(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn campaign_error(context: &str, err: CampaignError) -> CliError {
    match err {
        CampaignError::Channel(err) => channel_error(context, err),
        CampaignError::Protect(err) => protect_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_rates_map_to_usage() {
        let err = campaign_error(
            "campaign",
            CampaignError::Channel(ChannelError::InvalidRate {
                name: "drop",
                value: 2.0,
            }),
        );
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("campaign: drop probability"));
    }

    #[test]
    fn buffer_errors_are_internal() {
        let err = protect_error(
            "airbag",
            ProtectError::BufferTooSmall {
                len: 1,
                required: 5,
            },
        );
        assert_eq!(err.code, INTERNAL);
    }
}
