//! Subcommands of the `narrator` binary.

use std::path::PathBuf;

use clap::Subcommand;
use narrator_core::{PlaybackRate, Voice};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Speak text aloud, streaming audio as it is synthesized
    Speak {
        /// Text to speak
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Voice to speak with
        #[arg(long, default_value = "alloy")]
        voice: Voice,
        /// Playback rate (0.75, 1, 1.25 or 1.5)
        #[arg(long, default_value = "1", value_parser = parse_rate)]
        rate: PlaybackRate,
    },

    /// List the available voices
    Voices,
}

/// Parse a rate preset, with or without a trailing `x`.
pub fn parse_rate(value: &str) -> Result<PlaybackRate, String> {
    let number = value.trim().trim_end_matches(['x', 'X']);
    let multiplier: f32 = number
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    PlaybackRate::from_multiplier(multiplier)
        .ok_or_else(|| format!("unsupported rate '{value}' (expected 0.75, 1, 1.25 or 1.5)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;

    #[test]
    fn rate_accepts_presets_only() {
        assert_eq!(parse_rate("1.25"), Ok(PlaybackRate::Fast));
        assert_eq!(parse_rate("0.75x"), Ok(PlaybackRate::Slow));
        assert_eq!(parse_rate("1"), Ok(PlaybackRate::Normal));
        assert!(parse_rate("2").unwrap_err().contains("unsupported"));
        assert!(parse_rate("fast").is_err());
    }

    #[test]
    fn speak_parses_voice_and_rate() {
        let cli = Cli::parse_from([
            "narrator", "speak", "--text", "Hello.", "--voice", "nova", "--rate", "1.5",
        ]);
        match cli.command {
            Some(Commands::Speak {
                text, voice, rate, ..
            }) => {
                assert_eq!(text.as_deref(), Some("Hello."));
                assert_eq!(voice, Voice::Nova);
                assert_eq!(rate, PlaybackRate::Faster);
            }
            _ => panic!("expected speak"),
        }
    }

    #[test]
    fn speak_requires_exactly_one_text_source() {
        assert!(Cli::try_parse_from(["narrator", "speak"]).is_err());
        assert!(
            Cli::try_parse_from(["narrator", "speak", "--text", "a", "--file", "b.txt"]).is_err()
        );
        assert!(Cli::try_parse_from(["narrator", "speak", "--voice", "robot", "--text", "a"]).is_err());
    }
}
