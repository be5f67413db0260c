#![forbid(unsafe_code)]

//! `shellherd`: declarative orchestrator for named interactive shell sessions.
//!
//! Loads the workspace configuration, starts the auto-start sessions, watches
//! the configuration for changes and reads commands from stdin, one per line.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use shellherd::commands::{CommandId, Invocation};
use shellherd::config_watcher::{reload_config, ConfigWatcher};
use shellherd::events::{self, Event, EventSender};
use shellherd::host::{ConsoleNotifier, NoticeLevel, Notifier, NotifyWatchHost, ProcessTerminalHost};
use shellherd::{AppError, Orchestrator, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shellherd", about = "Declarative shell session orchestrator", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "shellherd.toml")]
    config: PathBuf,

    /// Override the workspace root that relative locations resolve against.
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Do not start the auto-start sessions on launch.
    #[arg(long)]
    no_autostart: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("shellherd bootstrap");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?;
    let result = runtime.block_on(run(args));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let workspace_override = args.workspace;
    let config = reload_config(&args.config, workspace_override.as_deref())?;
    info!(
        sessions = config.sessions.len(),
        groups = config.groups.len(),
        modules = config.modules.len(),
        root = ?config.workspace_root,
        "configuration loaded"
    );

    // ── Wire host collaborators ─────────────────────────
    let (tx, rx) = events::channel();
    let orchestrator = Orchestrator::new(
        config,
        Box::new(ProcessTerminalHost::new(tx.clone())),
        Box::new(NotifyWatchHost::new(tx.clone())),
        Box::new(ConsoleNotifier),
    );

    let _config_watcher = match ConfigWatcher::new(&args.config, workspace_override, tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(%err, "config hot-reload disabled");
            None
        }
    };

    if !args.no_autostart {
        let _ = tx.send(Event::Command(Invocation::new(CommandId::StartAll)));
    }

    // ── Run ─────────────────────────────────────────────
    let ct = CancellationToken::new();
    let loop_handle = tokio::spawn(orchestrator.run(rx, ct.clone()));
    let input_handle = tokio::spawn(read_commands(tx, ct.clone()));

    tokio::select! {
        () = shutdown_signal() => info!("shutdown signal received"),
        () = ct.cancelled() => info!("command input closed"),
    }
    ct.cancel();

    if let Err(err) = loop_handle.await {
        error!(%err, "orchestrator task failed");
    }
    input_handle.abort();
    info!("shellherd shut down");
    Ok(())
}

/// Forward stdin lines to the orchestrator until EOF or `quit`.
async fn read_commands(tx: EventSender, ct: CancellationToken) {
    let notifier = ConsoleNotifier;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!(%err, "failed to read command input");
                break;
            }
        };
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        match Invocation::parse(&line) {
            Ok(Some(invocation)) => {
                if tx.send(Event::Command(invocation)).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => {
                let known: Vec<&str> = CommandId::ALL.into_iter().map(CommandId::as_str).collect();
                notifier.notify(
                    NoticeLevel::Error,
                    &format!("{err}; expected one of: {}", known.join(", ")),
                );
            }
        }
    }
    ct.cancel();
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
