//! Line-oriented console boundary: commands in on stdin, events out on stdout.

use flow_core::stopwatch::FocusStopwatch;
use flow_runtime::tracker::UiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Quit,
}

/// Parse one input line. Blank or unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    match line.trim().to_lowercase().as_str() {
        "start" | "s" => Some(ConsoleCommand::Start),
        "stop" | "x" => Some(ConsoleCommand::Stop),
        "quit" | "q" | "exit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

/// One output line for `event`, including the productive-time stopwatch.
pub fn render_event(event: &UiEvent, stopwatch: &FocusStopwatch) -> String {
    match event {
        UiEvent::TrackingStarted => "tracking started".to_string(),
        UiEvent::TrackingStopped => {
            format!("tracking stopped (focus {})", stopwatch.display())
        }
        UiEvent::StateChange(update) => format!(
            "[{:<8}] score {:>3} | focus {}",
            update.state.as_str(),
            update.score,
            stopwatch.display()
        ),
    }
}
