//! Admin control surface (C11): a line-oriented stdin command loop that
//! drives the listener's lifecycle, independent of the HTTP worker pool.
//!
//! New module — the teacher ships no operator interface of its own. Grounded
//! in the pack's general preference for explicit, typed command dispatch
//! (match-on-parsed-enum) over ad hoc string branching.

use crate::log::{LogBuffer, LogLevel};
use crate::server::listener::Listener;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

enum Command {
    Start,
    Restart,
    Shutdown,
    Status,
    Connections,
    Log(Option<LogLevel>),
    Clear,
    Help,
    End { save: bool },
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let mut parts = line.trim().split_whitespace();
        match parts.next() {
            Some(".start") => Command::Start,
            Some(".restart") => Command::Restart,
            Some(".shutdown") => Command::Shutdown,
            Some(".status") => Command::Status,
            Some(".connections") => Command::Connections,
            Some(".clear") => Command::Clear,
            Some(".help") => Command::Help,
            Some(".log") => Command::Log(match parts.next() {
                Some("--info") => Some(LogLevel::Info),
                Some("--warn") => Some(LogLevel::Warn),
                Some("--error") => Some(LogLevel::Error),
                _ => None,
            }),
            Some(".end") => Command::End {
                save: parts.next() == Some("--save"),
            },
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Unknown(String::new()),
        }
    }
}

const HELP_TEXT: &str = "\
Commands:
  .start                 start the listener if it is not already running
  .restart               shut down, then start again
  .shutdown              stop accepting and drain in-flight connections
  .status                show running state, host/port, uptime
  .connections           show the number of active connections
  .log [--info|--error|--warn]   print the log buffer, optionally filtered
  .clear                 empty the log buffer
  .help                  show this text
  .end [--save]          exit the process (refuses while running)";

/// Runs the command loop until `.end` succeeds. `started_at` is recorded once
/// the listener is first launched, for `.status`'s uptime figure.
pub(crate) async fn run(listener: Arc<Listener>, log_buffer: Arc<LogBuffer>) {
    let mut started_at: Option<Instant> = Some(Instant::now());
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => return,
        };

        match Command::parse(&line) {
            Command::Start => {
                if listener.is_running() {
                    println!("already running");
                } else {
                    listener.start().await;
                    started_at = Some(Instant::now());
                    println!("started");
                }
            }
            Command::Restart => {
                listener.shutdown().await;
                listener.start().await;
                started_at = Some(Instant::now());
                println!("restarted");
            }
            Command::Shutdown => {
                listener.shutdown().await;
                println!("shut down");
            }
            Command::Status => {
                let uptime = started_at.map(|t| t.elapsed().as_secs()).unwrap_or(0);
                println!(
                    "running: {}, address: {}, uptime: {}s",
                    listener.is_running(),
                    listener.bind_addr(),
                    uptime
                );
            }
            Command::Connections => {
                println!("active connections: {}", listener.active_connections());
            }
            Command::Log(level) => {
                for record in log_buffer.snapshot(level) {
                    println!("{record}");
                }
            }
            Command::Clear => {
                log_buffer.clear();
                println!("log buffer cleared");
            }
            Command::Help => println!("{HELP_TEXT}"),
            Command::End { save } => {
                if listener.is_running() {
                    println!("server is running; run .shutdown first");
                    continue;
                }
                if save {
                    if let Err(e) = save_log(&log_buffer).await {
                        println!("failed to save log: {e}");
                        continue;
                    }
                }
                return;
            }
            Command::Unknown(_) => {
                println!("unrecognized command; try .help");
            }
        }
    }
}

async fn save_log(buffer: &LogBuffer) -> std::io::Result<()> {
    let text: String = buffer
        .snapshot(None)
        .into_iter()
        .map(|r| format!("{r}\n"))
        .collect();
    tokio::fs::write("fileden.log", text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_level_flags() {
        assert!(matches!(Command::parse(".log --error"), Command::Log(Some(LogLevel::Error))));
        assert!(matches!(Command::parse(".log"), Command::Log(None)));
    }

    #[test]
    fn parses_end_save_flag() {
        assert!(matches!(Command::parse(".end --save"), Command::End { save: true }));
        assert!(matches!(Command::parse(".end"), Command::End { save: false }));
    }

    #[test]
    fn unrecognized_command_does_not_panic() {
        assert!(matches!(Command::parse("banana"), Command::Unknown(_)));
    }
}
