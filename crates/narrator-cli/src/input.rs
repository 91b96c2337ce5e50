//! Interactive transport commands typed while speaking.

use std::io::BufRead;

use narrator_core::Voice;
use tokio::sync::mpsc;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportInput {
    TogglePause,
    CycleRate,
    Voice(Voice),
    Quit,
    Help,
}

/// Parse a line typed at the prompt. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Result<Option<TransportInput>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let input = match command.to_ascii_lowercase().as_str() {
        "p" | "pause" | "play" => TransportInput::TogglePause,
        "r" | "rate" => TransportInput::CycleRate,
        "q" | "quit" | "exit" => TransportInput::Quit,
        "h" | "help" | "?" => TransportInput::Help,
        "v" | "voice" => {
            let name = words
                .next()
                .ok_or_else(|| "usage: v <voice>".to_string())?;
            TransportInput::Voice(name.parse().map_err(|e| format!("{e}"))?)
        }
        other => return Err(format!("unknown command '{other}' (type 'h' for help)")),
    };
    Ok(Some(input))
}

pub const HELP: &str = "p: pause/resume  r: cycle rate  v <voice>: change voice  q: quit";

/// Forward stdin lines to the async side.
///
/// Reading runs on a detached OS thread so an idle terminal never keeps the
/// runtime from shutting down. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
