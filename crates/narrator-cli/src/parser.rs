//! Root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line player for streamed speech synthesis.
#[derive(Parser)]
#[command(name = "narrator")]
#[command(about = "Listen to text through a streaming speech-synthesis service")]
#[command(version)]
pub struct Cli {
    /// Base URL of the synthesis service
    #[arg(
        long = "server-url",
        env = "NARRATOR_SERVER_URL",
        global = true,
        default_value = "http://localhost:8000/api/tts/"
    )]
    pub server_url: String,

    /// Bearer token for the synthesis service
    #[arg(long, env = "NARRATOR_API_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "narrator",
            "--server-url",
            "https://tts.example.edu/api/",
            "--verbose",
            "voices",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.server_url, "https://tts.example.edu/api/");
        assert!(matches!(cli.command, Some(Commands::Voices)));
    }
}
