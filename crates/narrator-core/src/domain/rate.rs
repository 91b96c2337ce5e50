//! Playback rate presets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the fixed playback rates a listener can cycle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackRate {
    #[serde(rename = "0.75")]
    Slow,
    #[default]
    #[serde(rename = "1")]
    Normal,
    #[serde(rename = "1.25")]
    Fast,
    #[serde(rename = "1.5")]
    Faster,
}

impl PlaybackRate {
    /// Presets in cycling order.
    pub const ALL: [Self; 4] = [Self::Slow, Self::Normal, Self::Fast, Self::Faster];

    /// Speed multiplier applied to media resources.
    pub const fn multiplier(self) -> f32 {
        match self {
            Self::Slow => 0.75,
            Self::Normal => 1.0,
            Self::Fast => 1.25,
            Self::Faster => 1.5,
        }
    }

    /// The preset after this one, wrapping back to the slowest.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Slow => Self::Normal,
            Self::Normal => Self::Fast,
            Self::Fast => Self::Faster,
            Self::Faster => Self::Slow,
        }
    }

    /// Match a multiplier to its preset.
    pub fn from_multiplier(multiplier: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rate| (rate.multiplier() - multiplier).abs() < 0.001)
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_all_presets() {
        let mut rate = PlaybackRate::Normal;
        let mut seen = Vec::new();
        for _ in 0..4 {
            rate = rate.next();
            seen.push(rate.multiplier());
        }
        assert_eq!(seen, vec![1.25, 1.5, 0.75, 1.0]);
    }

    #[test]
    fn from_multiplier_matches_presets_only() {
        assert_eq!(PlaybackRate::from_multiplier(1.25), Some(PlaybackRate::Fast));
        assert_eq!(PlaybackRate::from_multiplier(2.0), None);
    }

    #[test]
    fn serializes_as_numeric_label() {
        assert_eq!(serde_json::to_value(PlaybackRate::Slow).unwrap(), "0.75");
        assert_eq!(PlaybackRate::Faster.to_string(), "1.5x");
    }
}
