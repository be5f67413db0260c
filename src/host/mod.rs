//! Host collaborator contracts.
//!
//! The orchestrator never touches processes, watchers or the user directly;
//! it goes through these traits. Production implementations live in the
//! submodules; tests substitute recording fakes.

use std::path::{Path, PathBuf};

use crate::models::SessionId;
use crate::orchestrator::watch_registry::WatchId;
use crate::script::ShellDialect;
use crate::Result;

pub mod console;
pub mod fs_watch;
pub mod process;

pub use console::{ConsoleNotifier, ScriptedPicker};
pub use fs_watch::NotifyWatchHost;
pub use process::ProcessTerminalHost;

/// Parameters for creating one interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalRequest {
    /// Registered session name.
    pub name: String,
    /// Identity assigned by the registry.
    pub id: SessionId,
    /// Working directory; `None` means the host default.
    pub working_dir: Option<PathBuf>,
    /// Shell dialect the session runs.
    pub dialect: ShellDialect,
}

/// A live interactive session.
pub trait Terminal: Send {
    /// Make the session visible to the user.
    fn show(&mut self);

    /// Feed one newline-terminated line of input. Never waits for completion.
    fn send_text(&mut self, text: &str);

    /// Terminate the session. Calling this more than once is a no-op.
    fn dispose(&mut self);
}

/// Factory for interactive sessions.
///
/// Implementations must report every session end (user closed, process
/// exited, disposed) as an [`crate::events::Event::SessionClosed`].
pub trait TerminalHost: Send {
    /// Create a session for `request`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Terminal` if the session cannot be created.
    fn create(&mut self, request: &TerminalRequest) -> Result<Box<dyn Terminal>>;
}

/// A live file watch. Dropping or disposing it stops event delivery.
pub trait FileWatch: Send {
    /// Stop watching. Calling this more than once is a no-op.
    fn dispose(&mut self);
}

/// Factory for file watches.
///
/// Implementations report changes as [`crate::events::Event::FileChanged`]
/// and deletions as [`crate::events::Event::FileDeleted`], tagged with `id`.
pub trait WatchHost: Send {
    /// Start watching `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Watch` if the watch cannot be installed.
    fn watch(&mut self, path: &Path, id: WatchId) -> Result<Box<dyn FileWatch>>;
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational; no action needed.
    Info,
    /// A configuration problem the user should fix.
    Warning,
    /// An operation failed.
    Error,
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send {
    /// Show `message` at `level`.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// One entry in a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    /// Value returned when chosen.
    pub label: String,
    /// Secondary text shown next to the label.
    pub description: String,
}

impl PickItem {
    /// Item with an empty description.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
        }
    }

    /// Item with a description.
    #[must_use]
    pub fn described(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Single- and multi-select prompts.
pub trait Picker {
    /// Let the user choose one item; `None` when nothing was chosen.
    fn pick_one(&mut self, placeholder: &str, items: &[PickItem]) -> Option<String>;

    /// Let the user choose any number of items; empty when nothing was chosen.
    fn pick_many(&mut self, placeholder: &str, items: &[PickItem]) -> Vec<String>;
}
