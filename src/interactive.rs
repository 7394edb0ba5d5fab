//! Operator controls: "q" on stdin and Ctrl-C both request a quit.

use std::io::BufRead;
use std::thread;

use tracing::{debug, info};

use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// True for a line whose first non-whitespace character is `q`.
pub fn is_quit_command(line: &str) -> bool {
    line.trim_start().starts_with('q')
}

/// Read lines on a background thread until a quit command or end of input.
///
/// A plain thread rather than a runtime task, so a pending stdin read never
/// holds up process exit.
pub fn spawn_quit_listener<R>(
    reader: R,
    shutdown: ShutdownSignal,
) -> std::io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("quit-listener".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) if is_quit_command(&line) => {
                        info!("Quit requested from console");
                        shutdown.trigger(ShutdownReason::Quit);
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Console listener stopped: {}", e);
                        return;
                    }
                }
            }
        })
}

/// Treat Ctrl-C like a quit command.
pub fn spawn_interrupt_listener(shutdown: ShutdownSignal) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            shutdown.trigger(ShutdownReason::Quit);
        }
    })
}
