use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtectError;

/// Outcome of an `init`, `protect` or `check` call.
///
/// `Undefined` is a sentinel: no operation ever returns it. Seeing it means
/// the classification table has a hole.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum E2eResult {
    /// Success; for `check`, the counter is exactly one past the last accepted.
    Ok = 0,
    /// Counter skipped ahead, but within `max_seq_diff`.
    OkSomeLost = 1,
    /// First valid frame since `init`.
    Initial = 2,
    /// Same counter as the last accepted frame.
    Repetition = 3,
    /// Counter skipped ahead by more than `max_seq_diff`.
    OutOfSequence = 4,
    /// Checksum mismatch.
    WrongCrc = 5,
    /// Absent or invalid configuration.
    NoConfiguration = 6,
    #[default]
    Undefined = 7,
}

impl E2eResult {
    /// Every kind, in discriminant order.
    pub const ALL: [E2eResult; 8] = [
        E2eResult::Ok,
        E2eResult::OkSomeLost,
        E2eResult::Initial,
        E2eResult::Repetition,
        E2eResult::OutOfSequence,
        E2eResult::WrongCrc,
        E2eResult::NoConfiguration,
        E2eResult::Undefined,
    ];

    /// Stable label for logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            E2eResult::Ok => "OK",
            E2eResult::OkSomeLost => "OK_SOME_LOST",
            E2eResult::Initial => "INITIAL",
            E2eResult::Repetition => "REPETITION",
            E2eResult::OutOfSequence => "OUT_OF_SEQUENCE",
            E2eResult::WrongCrc => "WRONG_CRC",
            E2eResult::NoConfiguration => "NO_CONFIGURATION",
            E2eResult::Undefined => "UNDEFINED",
        }
    }

    /// Returns true for the kinds whose payload an application should act on.
    pub fn is_accepted(self) -> bool {
        matches!(self, E2eResult::Ok | E2eResult::OkSomeLost)
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for E2eResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for E2eResult {
    type Error = ProtectError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        E2eResult::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(ProtectError::UnknownResult(code))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn labels_are_distinct() {
        let labels: HashSet<&str> = E2eResult::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(labels.len(), E2eResult::ALL.len());
    }

    #[test]
    fn codes_round_trip_through_try_from() {
        for kind in E2eResult::ALL {
            assert_eq!(E2eResult::try_from(kind.code()).unwrap(), kind);
        }
        assert!(matches!(
            E2eResult::try_from(8),
            Err(ProtectError::UnknownResult(8))
        ));
    }

    #[test]
    fn default_is_the_undefined_sentinel() {
        assert_eq!(E2eResult::default(), E2eResult::Undefined);
    }

    #[test]
    fn only_ok_kinds_are_accepted() {
        let accepted: Vec<E2eResult> = E2eResult::ALL
            .into_iter()
            .filter(|r| r.is_accepted())
            .collect();
        assert_eq!(accepted, vec![E2eResult::Ok, E2eResult::OkSomeLost]);
    }

    #[test]
    fn display_and_serde_use_the_label() {
        assert_eq!(E2eResult::OutOfSequence.to_string(), "OUT_OF_SEQUENCE");
        assert_eq!(
            serde_json::to_string(&E2eResult::OkSomeLost).unwrap(),
            "\"OK_SOME_LOST\""
        );
        assert_eq!(
            serde_json::from_str::<E2eResult>("\"WRONG_CRC\"").unwrap(),
            E2eResult::WrongCrc
        );
    }
}
