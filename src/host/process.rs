//! Child-process backed interactive sessions.
//!
//! Each session is a shell reading commands from a piped stdin, with
//! stdout/stderr inherited so its output shows up in the orchestrator's
//! console. Sent text is detached from that pipe where the dialect allows
//! it, so commands cannot read the shell's own input. A per-session task forwards input lines, waits for the shell to
//! exit and kills it on dispose. Every session end is reported back to the
//! orchestrator as a closure event.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::events::{Event, EventSender};
use crate::host::{Terminal, TerminalHost, TerminalRequest};
use crate::models::SessionId;
use crate::script::ShellDialect;
use crate::{AppError, Result};

/// Spawns one shell process per session.
pub struct ProcessTerminalHost {
    events: EventSender,
}

impl ProcessTerminalHost {
    /// Create a host that reports session ends on `events`.
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl TerminalHost for ProcessTerminalHost {
    fn create(&mut self, request: &TerminalRequest) -> Result<Box<dyn Terminal>> {
        let (program, args) = request.dialect.program();
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("SHELLHERD_SESSION", &request.name)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(ref dir) = request.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|err| {
            AppError::Terminal(format!(
                "failed to spawn {program} for session '{}': {err}",
                request.name
            ))
        })?;
        let stdin = child.stdin.take().ok_or_else(|| {
            AppError::Terminal(format!("session '{}' has no stdin pipe", request.name))
        })?;

        info!(
            session = %request.name,
            id = %request.id,
            pid = child.id().unwrap_or(0),
            shell = program,
            "session process spawned"
        );

        let (input, input_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let span = info_span!("session_process", session = %request.name, id = %request.id);
        tokio::spawn(
            drive_session(
                child,
                stdin,
                input_rx,
                cancel.clone(),
                self.events.clone(),
                request.name.clone(),
                request.id,
            )
            .instrument(span),
        );

        Ok(Box::new(ProcessTerminal {
            name: request.name.clone(),
            dialect: request.dialect,
            input: Some(input),
            cancel,
        }))
    }
}

/// Handle to a running shell process.
struct ProcessTerminal {
    name: String,
    dialect: ShellDialect,
    input: Option<mpsc::UnboundedSender<String>>,
    cancel: CancellationToken,
}

impl Terminal for ProcessTerminal {
    fn show(&mut self) {
        info!(session = %self.name, "session attached to console");
    }

    fn send_text(&mut self, text: &str) {
        let Some(ref input) = self.input else {
            warn!(session = %self.name, "send to disposed session ignored");
            return;
        };
        if input.send(self.dialect.detach_stdin(text)).is_err() {
            warn!(session = %self.name, "session process already exited; input dropped");
        }
    }

    fn dispose(&mut self) {
        if self.input.take().is_some() {
            self.cancel.cancel();
        }
    }
}

impl Drop for ProcessTerminal {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn drive_session(
    mut child: Child,
    mut stdin: ChildStdin,
    mut input: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
    events: EventSender,
    name: String,
    id: SessionId,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                if let Err(err) = child.kill().await {
                    warn!(%err, "failed to kill session process");
                }
                info!("session process disposed");
                break;
            }
            status = child.wait() => {
                match status {
                    Ok(status) => info!(?status, "session process exited"),
                    Err(err) => warn!(%err, "failed to wait for session process"),
                }
                break;
            }
            Some(mut line) = input.recv() => {
                line.push('\n');
                if let Err(err) = write_line(&mut stdin, &line).await {
                    warn!(%err, "failed to write to session stdin");
                }
            }
        }
    }

    // Receiver gone means the orchestrator is shutting down; nothing to notify.
    let _ = events.send(Event::SessionClosed { name, id });
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}
