//! Audio bitrate classes offered for download.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed set of output bitrates. Any other value is a construction error,
/// enforced by `FromStr` before a job can be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitrateClass {
    Kbps128,
    Kbps256,
    Kbps320,
}

impl BitrateClass {
    /// All available bitrates, in the order they are presented to the user.
    pub const ALL: &'static [BitrateClass] = &[
        BitrateClass::Kbps128,
        BitrateClass::Kbps256,
        BitrateClass::Kbps320,
    ];

    /// Numeric bitrate in kbps.
    pub fn kbps(&self) -> u32 {
        match self {
            BitrateClass::Kbps128 => 128,
            BitrateClass::Kbps256 => 256,
            BitrateClass::Kbps320 => 320,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BitrateClass::Kbps128 => "128",
            BitrateClass::Kbps256 => "256",
            BitrateClass::Kbps320 => "320",
        }
    }
}

impl fmt::Display for BitrateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BitrateClass {
    type Err = BitrateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "128" => Ok(BitrateClass::Kbps128),
            "256" => Ok(BitrateClass::Kbps256),
            "320" => Ok(BitrateClass::Kbps320),
            _ => Err(BitrateParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown bitrate: {0}")]
pub struct BitrateParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_parse() {
        assert_eq!("128".parse::<BitrateClass>().unwrap(), BitrateClass::Kbps128);
        assert_eq!("256".parse::<BitrateClass>().unwrap(), BitrateClass::Kbps256);
        assert_eq!("320".parse::<BitrateClass>().unwrap(), BitrateClass::Kbps320);
    }

    #[test]
    fn test_bitrate_parse_rejects_everything_else() {
        assert!("192".parse::<BitrateClass>().is_err());
        assert!("999".parse::<BitrateClass>().is_err());
        assert!("128k".parse::<BitrateClass>().is_err());
        assert!("".parse::<BitrateClass>().is_err());
        assert!("-128".parse::<BitrateClass>().is_err());
    }

    #[test]
    fn test_bitrate_round_trip() {
        for bitrate in BitrateClass::ALL {
            assert_eq!(bitrate.as_str().parse::<BitrateClass>().unwrap(), *bitrate);
        }
    }

    #[test]
    fn test_kbps_values() {
        let values: Vec<u32> = BitrateClass::ALL.iter().map(|b| b.kbps()).collect();
        assert_eq!(values, vec![128, 256, 320]);
    }
}
