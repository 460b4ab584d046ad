//! Line-oriented command input on stdin.
//!
//! Reads stdin on a single blocking task and forwards parsed commands to the
//! main application. End of input requests shutdown.

use crate::{AppCommand, AppError, AppResult, SurfaceState};

use std::{io::BufRead, panic::Location};

use error_location::ErrorLocation;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, instrument, warn};

/// Help text printed for unknown input.
pub const USAGE: &str = "commands: list | select <id|n> | send | auto on|off | stop | hide | show | status | quit";

/// Parse one console line.
#[track_caller]
pub fn parse_command(line: &str) -> AppResult<AppCommand> {
    let invalid = |reason: &str| AppError::InvalidCommand {
        input: line.to_string(),
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let mut words = line.split_whitespace();
    let verb = words.next().ok_or_else(|| invalid("empty input"))?;
    let arg = words.next();

    if words.next().is_some() {
        return Err(invalid("too many arguments"));
    }

    let command = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("list", None) => AppCommand::ListDevices,
        ("select", Some(device)) => AppCommand::SelectDevice {
            device: device.to_string(),
        },
        ("select", None) => return Err(invalid("select needs a device id or number")),
        ("send", None) => AppCommand::SendNow,
        ("auto", Some("on")) => AppCommand::SetAuto { enabled: true },
        ("auto", Some("off")) => AppCommand::SetAuto { enabled: false },
        ("auto", _) => return Err(invalid("auto takes on or off")),
        ("stop", None) => AppCommand::StopCamera,
        ("hide", None) => AppCommand::VisibilityChanged(SurfaceState::Hidden),
        ("show", None) => AppCommand::VisibilityChanged(SurfaceState::Visible),
        ("status", None) => AppCommand::Status,
        ("quit" | "exit", None) => AppCommand::Shutdown,
        (_, Some(_)) => return Err(invalid("unexpected argument")),
        _ => return Err(invalid("unknown command")),
    };

    Ok(command)
}

/// Spawn the stdin forwarder.
///
/// The task ends when stdin closes or the receiving side is dropped. A task
/// stuck in `read_line` is discarded by the runtime's shutdown timeout.
#[instrument(skip(command_tx))]
pub fn spawn_console(command_tx: mpsc::Sender<AppCommand>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read console input");
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Ok(command) => {
                    if let Err(e) = forward(&command_tx, command) {
                        debug!(error = ?e, "Console forwarder stopping");
                        return;
                    }
                }
                Err(e) => {
                    debug!(error = ?e, "Rejected console input");
                    println!("{}", USAGE);
                }
            }
        }

        if let Err(e) = forward(&command_tx, AppCommand::Shutdown) {
            debug!(error = ?e, "Application already gone at end of input");
        }
    })
}

#[track_caller]
fn forward(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) -> AppResult<()> {
    command_tx
        .blocking_send(command)
        .map_err(|e| AppError::ChannelSendFailed {
            message: format!("Failed to forward console command: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
}
