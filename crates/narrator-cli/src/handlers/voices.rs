//! `narrator voices`: list the roster.

use std::fmt::Write;

use narrator_core::Voice;

/// Render the voice roster, one voice per line.
pub fn format_roster() -> String {
    let mut out = String::new();
    for voice in Voice::ALL {
        let marker = if voice == Voice::default() { " (default)" } else { "" };
        let _ = writeln!(out, "{:<8} {}{marker}", voice.as_str(), voice.display_name());
    }
    out
}

pub fn execute() {
    print!("{}", format_roster());
}
