//! Events funneled into the orchestrator's single event loop.
//!
//! File watches, session closures, configuration reloads and user commands
//! all arrive here so that registry mutations happen one at a time.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::commands::Invocation;
use crate::config::WorkspaceConfig;
use crate::models::SessionId;
use crate::orchestrator::watch_registry::WatchId;

/// Sending half of the orchestrator event channel.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Receiving half of the orchestrator event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Create a new orchestrator event channel.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// An asynchronous input to the orchestrator.
#[derive(Debug)]
pub enum Event {
    /// A watched manifest was written or replaced.
    FileChanged {
        /// Absolute path of the watched file.
        path: PathBuf,
        /// Watch that observed the change.
        watch: WatchId,
    },
    /// A watched manifest disappeared.
    FileDeleted {
        /// Absolute path of the watched file.
        path: PathBuf,
        /// Watch that observed the deletion.
        watch: WatchId,
    },
    /// The host reports that a session ended for any reason.
    SessionClosed {
        /// Registered session name.
        name: String,
        /// Instance that ended.
        id: SessionId,
    },
    /// A new, already validated configuration snapshot.
    ConfigChanged(Box<WorkspaceConfig>),
    /// A user command with its picker answers.
    Command(Invocation),
}
