//! Selection tokens carried by inline keyboard buttons.
//!
//! A token is self-describing: the callback payload alone re-identifies
//! the candidate (and bitrate, once chosen) with no server-side session.
//! Telegram caps callback data at 64 bytes; the longest form here is
//! `dl:` + 11-char id + `:320` = 19 bytes.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::bitrate::{BitrateClass, BitrateParseError};
use crate::track::{TrackId, TrackIdError};

/// Decoded callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionToken {
    /// Candidate chosen from search results; bitrate not yet chosen.
    Pick(TrackId),
    /// Candidate and bitrate both chosen; a job may start.
    Download(TrackId, BitrateClass),
    /// Help-screen button on the welcome message.
    Help,
}

impl SelectionToken {
    /// Wire encoding used as `callback_data`.
    pub fn encode(&self) -> String {
        match self {
            SelectionToken::Pick(track) => format!("pick:{track}"),
            SelectionToken::Download(track, bitrate) => format!("dl:{track}:{bitrate}"),
            SelectionToken::Help => "help".to_string(),
        }
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for SelectionToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "help" {
            return Ok(SelectionToken::Help);
        }
        if let Some(id) = s.strip_prefix("pick:") {
            return Ok(SelectionToken::Pick(TrackId::parse(id)?));
        }
        if let Some(rest) = s.strip_prefix("dl:") {
            let (id, kbps) = rest
                .split_once(':')
                .ok_or_else(|| TokenParseError::Unknown(s.to_string()))?;
            return Ok(SelectionToken::Download(
                TrackId::parse(id)?,
                kbps.parse()?,
            ));
        }
        Err(TokenParseError::Unknown(s.to_string()))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenParseError {
    #[error("unrecognized selection token: {0:?}")]
    Unknown(String),
    #[error(transparent)]
    Track(#[from] TrackIdError),
    #[error(transparent)]
    Bitrate(#[from] BitrateParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackId {
        TrackId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_encode() {
        assert_eq!(SelectionToken::Pick(track()).encode(), "pick:dQw4w9WgXcQ");
        assert_eq!(
            SelectionToken::Download(track(), BitrateClass::Kbps256).encode(),
            "dl:dQw4w9WgXcQ:256"
        );
        assert_eq!(SelectionToken::Help.encode(), "help");
    }

    #[test]
    fn test_round_trip() {
        let tokens = [
            SelectionToken::Pick(track()),
            SelectionToken::Download(track(), BitrateClass::Kbps128),
            SelectionToken::Download(track(), BitrateClass::Kbps320),
            SelectionToken::Help,
        ];
        for token in tokens {
            assert_eq!(token.encode().parse::<SelectionToken>().unwrap(), token);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "gibberish".parse::<SelectionToken>(),
            Err(TokenParseError::Unknown(_))
        ));
        assert!(matches!(
            "dl:dQw4w9WgXcQ".parse::<SelectionToken>(),
            Err(TokenParseError::Unknown(_))
        ));
        assert!(matches!(
            "pick:bad".parse::<SelectionToken>(),
            Err(TokenParseError::Track(_))
        ));
    }

    #[test]
    fn test_parse_rejects_off_menu_bitrate() {
        // A forged token with an unlisted bitrate is rejected before any
        // job could be created from it.
        assert!(matches!(
            "dl:dQw4w9WgXcQ:999".parse::<SelectionToken>(),
            Err(TokenParseError::Bitrate(_))
        ));
        assert!(matches!(
            "dl:dQw4w9WgXcQ:256k".parse::<SelectionToken>(),
            Err(TokenParseError::Bitrate(_))
        ));
    }

    #[test]
    fn test_fits_callback_data_limit() {
        let longest = SelectionToken::Download(track(), BitrateClass::Kbps320).encode();
        assert!(longest.len() <= 64);
    }
}
