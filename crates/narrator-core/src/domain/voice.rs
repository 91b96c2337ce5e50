//! The fixed voice roster offered to listeners.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A synthesis voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    /// Every selectable voice, in display order.
    pub const ALL: [Self; 6] = [
        Self::Alloy,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Shimmer,
    ];

    /// Identifier sent to the synthesis service.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }

    /// Human-readable name for pickers.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Alloy => "Alloy",
            Self::Echo => "Echo",
            Self::Fable => "Fable",
            Self::Onyx => "Onyx",
            Self::Nova => "Nova",
            Self::Shimmer => "Shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A voice identifier outside the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown voice '{0}' (expected one of: alloy, echo, fable, onyx, nova, shimmer)")]
pub struct UnknownVoice(pub String);

impl FromStr for Voice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVoice(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Nova".parse::<Voice>().unwrap(), Voice::Nova);
        assert_eq!(" shimmer ".parse::<Voice>().unwrap(), Voice::Shimmer);
    }

    #[test]
    fn rejects_unknown_voice() {
        let err = "robot".parse::<Voice>().unwrap_err();
        assert_eq!(err, UnknownVoice("robot".to_string()));
        assert!(err.to_string().contains("robot"));
    }

    #[test]
    fn display_matches_wire_label() {
        for voice in Voice::ALL {
            let json = serde_json::to_value(voice).unwrap();
            assert_eq!(json, voice.to_string());
        }
    }
}
