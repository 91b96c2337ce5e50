//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use narrator_cli::handlers::{speak, voices};
use narrator_cli::{Cli, CliConfig, Commands, bootstrap};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads NARRATOR_* variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Voices => voices::execute(),
        Commands::Speak {
            text,
            file,
            voice,
            rate,
        } => {
            let text = speak::read_text(text, file.as_deref())?;
            let config = CliConfig {
                server_url: cli.server_url,
                token: cli.token,
            };
            let ctx = bootstrap(&config)?;
            speak::execute(&ctx, text, voice, rate).await?;
        }
    }

    Ok(())
}
