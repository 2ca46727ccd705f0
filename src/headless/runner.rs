//! Headless mode runner - script-driven event loop
//!
//! Lines are read on a plain thread (stdin is blocking) and handed to the
//! engine as messages. The engine itself stays on the runtime thread; after
//! every message its events are written out as NDJSON.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::thread::JoinHandle;

use lsw_app::{Command, Engine, Message};
use lsw_core::prelude::*;
use tokio::sync::mpsc;

use super::HeadlessEvent;

/// Run in headless mode, reading commands from `script` or stdin
pub async fn run_headless(project_path: &Path, script: Option<&Path>) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Lockscreen Widgets starting in HEADLESS mode");
    info!("Project: {}", project_path.display());
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::new(project_path.to_path_buf())?;
    engine.start_watcher();

    let tx = engine.msg_sender();
    match script {
        Some(path) => {
            info!("Reading commands from {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            spawn_line_reader(BufReader::new(file), tx);
        }
        None => {
            spawn_line_reader(BufReader::new(io::stdin()), tx);
        }
    }

    let mut stdout = io::stdout();
    let result = headless_event_loop(&mut engine, &mut stdout).await;

    engine.shutdown();
    if let Err(e) = write_pending(&engine, &mut stdout) {
        error!("Failed to write shutdown events: {}", e);
    }

    info!("Lockscreen Widgets headless mode exiting");
    result
}

/// Feed messages to the engine until it asks to quit, writing its events
/// to `out` after each one.
pub async fn headless_event_loop<W: Write>(engine: &mut Engine, out: &mut W) -> Result<()> {
    // Whatever happened while connecting
    write_pending(engine, out)?;

    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                write_pending(engine, out)?;
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

fn write_pending<W: Write>(engine: &Engine, out: &mut W) -> Result<()> {
    for event in engine.drain_events() {
        HeadlessEvent::from(event).write_to(out)?;
    }
    Ok(())
}

/// Parse lines from `reader` on a background thread and send them to the
/// engine. Ends with [`Message::InputClosed`] unless a `quit` line came first.
pub fn spawn_line_reader<R>(reader: R, msg_tx: mpsc::Sender<Message>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    std::thread::spawn(move || {
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let text = match line {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            };

            let msg = match Command::parse(line_no, &text) {
                Ok(Some(command)) => Message::Command {
                    line: line_no,
                    command,
                },
                Ok(None) => continue,
                Err(Error::Command { message, .. }) => Message::InvalidCommand {
                    line: line_no,
                    message,
                },
                Err(e) => Message::InvalidCommand {
                    line: line_no,
                    message: e.to_string(),
                },
            };

            let quit = matches!(
                msg,
                Message::Command {
                    command: Command::Quit,
                    ..
                }
            );
            if msg_tx.blocking_send(msg).is_err() {
                debug!("Engine gone, input reader exiting");
                return;
            }
            if quit {
                info!("Input: quit requested");
                return;
            }
        }

        let _ = msg_tx.blocking_send(Message::InputClosed);
        info!("Input reader exiting");
    })
}
