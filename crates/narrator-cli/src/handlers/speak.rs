//! `narrator speak`: play text to the end while accepting transport input.

use std::path::Path;

use anyhow::{Context, bail};
use narrator_core::{PlaybackPhase, PlaybackRate, TransportState, Voice};
use narrator_engine::{EngineConfig, TransportController};

use crate::bootstrap::CliContext;
use crate::input::{HELP, TransportInput, parse_input, spawn_stdin_reader};

/// Resolve the text to speak from `--text` or `--file`.
pub fn read_text(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("nothing to speak: pass --text or --file"),
    };
    if text.trim().is_empty() {
        bail!("nothing to speak: the text is empty");
    }
    Ok(text)
}

/// One status line for the terminal.
pub fn format_status(state: &TransportState) -> String {
    let position = if state.progress.total == 0 {
        String::from("-")
    } else {
        format!("{}/{}", (state.cursor + 1).min(state.progress.total), state.progress.total)
    };
    let mut line = format!(
        "[{:?}] chunk {position}  synthesized {}/{}  voice {}  {}",
        state.phase, state.progress.completed, state.progress.total, state.voice, state.rate
    );
    if let Some(error) = &state.error {
        line.push_str("  error: ");
        line.push_str(error);
    }
    line
}

/// Apply one line of input. Returns `false` when the user asked to quit.
async fn handle_line(controller: &TransportController, line: &str) -> anyhow::Result<bool> {
    match parse_input(line) {
        Ok(None) => {}
        Ok(Some(TransportInput::TogglePause)) => controller.toggle_play_pause()?,
        Ok(Some(TransportInput::CycleRate)) => controller.cycle_playback_rate()?,
        Ok(Some(TransportInput::Voice(voice))) => controller.set_voice(voice)?,
        Ok(Some(TransportInput::Help)) => eprintln!("{HELP}"),
        Ok(Some(TransportInput::Quit)) => {
            controller.close().await;
            return Ok(false);
        }
        Err(message) => eprintln!("{message}"),
    }
    Ok(true)
}

pub async fn execute(
    ctx: &CliContext,
    text: String,
    voice: Voice,
    rate: PlaybackRate,
) -> anyhow::Result<()> {
    let config = EngineConfig::new().with_voice(voice).with_rate(rate);
    let controller = ctx.engine(config).spawn();
    let mut state = controller.subscribe();
    let mut input = spawn_stdin_reader();
    let mut input_open = true;

    controller.speak(text)?;
    eprintln!("{HELP}");

    let mut last_line = String::new();
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                let line = format_status(&snapshot);
                if line != last_line {
                    eprintln!("{line}");
                    last_line = line;
                }
                if snapshot.phase.is_terminal() {
                    break;
                }
            }
            line = input.recv(), if input_open => match line {
                Some(line) => {
                    if !handle_line(&controller, &line).await? {
                        break;
                    }
                }
                None => input_open = false,
            },
        }
    }

    let final_state = controller.state();
    controller.close().await;
    match final_state.phase {
        PlaybackPhase::Failed => {
            bail!(final_state.error.unwrap_or_else(|| "playback failed".to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::Progress;

    #[test]
    fn text_flag_wins_and_blank_text_is_rejected() {
        assert_eq!(read_text(Some("Hi.".to_string()), None).unwrap(), "Hi.");
        assert!(read_text(Some("  ".to_string()), None).is_err());
        assert!(read_text(None, None).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_text(None, Some(Path::new("/nonexistent/chapter.txt"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/chapter.txt"));
    }

    #[test]
    fn status_line_shows_position_and_error() {
        let mut state = TransportState::new(Voice::Nova, PlaybackRate::Fast);
        state.phase = PlaybackPhase::Playing;
        state.progress = Progress::new(2, 5);
        state.cursor = 1;
        assert_eq!(
            format_status(&state),
            "[Playing] chunk 2/5  synthesized 2/5  voice nova  1.25x"
        );

        state.phase = PlaybackPhase::Failed;
        state.error = Some("bad input".to_string());
        assert!(format_status(&state).ends_with("error: bad input"));
    }

    #[test]
    fn status_line_before_job_starts() {
        let state = TransportState::new(Voice::Alloy, PlaybackRate::Normal);
        assert_eq!(
            format_status(&state),
            "[Idle] chunk -  synthesized 0/0  voice alloy  1x"
        );
    }
}
