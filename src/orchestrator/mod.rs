//! Session orchestration.
//!
//! [`Orchestrator`] owns the two shared tables (running sessions by name and
//! file watches by path) together with the host collaborators, and is the
//! only thing that mutates them. Lifecycle, reload, module and command logic
//! are split across the submodules as `impl Orchestrator` blocks.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::config::WorkspaceConfig;
use crate::events::{Event, EventReceiver};
use crate::host::{NoticeLevel, Notifier, ScriptedPicker, TerminalHost, WatchHost};
use crate::script::ShellDialect;
use crate::AppError;

pub mod dispatch;
pub mod lifecycle;
pub mod module_runner;
pub mod reload;
pub mod session_registry;
pub mod watch_registry;

pub use lifecycle::StartOutcome;
pub use reload::{diff_sessions, ReloadReport, SessionDiff};
pub use session_registry::{Admission, SessionRegistry};
pub use watch_registry::{WatchId, WatchRegistry};

/// Owner of every running session and file watch.
pub struct Orchestrator {
    config: WorkspaceConfig,
    sessions: SessionRegistry,
    watches: WatchRegistry,
    terminals: Box<dyn TerminalHost>,
    notifier: Box<dyn Notifier>,
    dialect: ShellDialect,
}

impl Orchestrator {
    /// Build an orchestrator for `config` with no sessions running.
    #[must_use]
    pub fn new(
        config: WorkspaceConfig,
        terminals: Box<dyn TerminalHost>,
        watch_host: Box<dyn WatchHost>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
            watches: WatchRegistry::new(watch_host),
            terminals,
            notifier,
            dialect: ShellDialect::host(),
        }
    }

    /// Override the shell dialect used for sessions and chained scripts.
    #[must_use]
    pub fn with_dialect(mut self, dialect: ShellDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Running sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Active file watches.
    #[must_use]
    pub fn watches(&self) -> &WatchRegistry {
        &self.watches
    }

    /// Shell dialect in use.
    #[must_use]
    pub fn dialect(&self) -> ShellDialect {
        self.dialect
    }

    /// Apply one event. Events are handled strictly one at a time.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::FileChanged { path, watch } => self.on_file_changed(&path, watch),
            Event::FileDeleted { path, watch } => self.on_file_deleted(&path, watch),
            Event::SessionClosed { name, id } => self.on_session_closed(&name, id),
            Event::ConfigChanged(config) => self.apply_config(*config),
            Event::Command(invocation) => {
                let mut picker = ScriptedPicker::new(invocation.answers);
                self.execute(invocation.command, &mut picker);
            }
        }
    }

    /// Process events until `cancel` fires or every sender is gone, then tear down.
    pub async fn run(mut self, mut events: EventReceiver, cancel: CancellationToken) -> Self {
        info!("orchestrator event loop started");
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("orchestrator shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        debug!(?event, "handling event");
                        self.handle_event(event);
                    }
                    None => {
                        info!("event channel closed");
                        break;
                    }
                },
            }
        }
        self.teardown();
        self
    }

    /// Dispose every session and watch.
    pub fn teardown(&mut self) {
        let _span = info_span!("teardown").entered();
        let sessions = self.sessions.remove_all();
        let watches = self.watches.dispose_all();
        info!(sessions, watches, "orchestrator torn down");
    }

    pub(crate) fn notify(&self, level: NoticeLevel, message: &str) {
        self.notifier.notify(level, message);
    }

    pub(crate) fn report(&self, err: &AppError) {
        self.notifier.notify(err.notice_level(), &err.to_string());
    }
}
