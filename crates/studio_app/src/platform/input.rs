use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use engine_logging::engine_debug;
use studio_core::{Msg, StepId};

pub const HELP: &str = "Type a query to generate a newsletter. Commands: :retry, :step <1-4>, :help, :quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    Help,
    Quit,
    /// Stdin is exhausted; the live session may still finish.
    EndOfInput,
    Unknown(String),
}

/// Interprets one line of user input. Blank lines yield nothing.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Some(Command::Dispatch(Msg::QuerySubmitted(line.to_string())));
    };

    let mut parts = command.split_whitespace();
    let parsed = match (parts.next(), parts.next()) {
        (Some("q" | "quit"), None) => Command::Quit,
        (Some("r" | "retry"), None) => Command::Dispatch(Msg::RetryClicked),
        (Some("h" | "help"), None) => Command::Help,
        (Some("s" | "step"), Some(ordinal)) => match ordinal
            .parse::<u8>()
            .ok()
            .and_then(|n| StepId::try_from(n).ok())
        {
            Some(step) => Command::Dispatch(Msg::StepSelected(step)),
            None => Command::Unknown(line.to_string()),
        },
        _ => Command::Unknown(line.to_string()),
    };
    Some(parsed)
}

/// Reads stdin on its own thread; sends `EndOfInput` once stdin is exhausted.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Command>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if let Some(command) = parse_command(&line) {
                if tx.send(command).is_err() {
                    return;
                }
            }
        }
        engine_debug!("stdin closed");
        let _ = tx.send(Command::EndOfInput);
    });
}
