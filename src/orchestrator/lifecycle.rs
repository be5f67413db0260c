//! Starting and stopping sessions, and the manifest watch protocol.
//!
//! A file-sourced session is restarted from scratch when its manifest
//! changes and stopped when its manifest is deleted. A restart keeps the
//! path's watch, so a file left briefly malformed by an edit is picked up
//! again on the next save.

use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use crate::host::{NoticeLevel, TerminalRequest};
use crate::manifest;
use crate::models::{SessionId, SessionSpec, SessionTag};
use crate::orchestrator::session_registry::Admission;
use crate::orchestrator::watch_registry::WatchId;
use crate::orchestrator::Orchestrator;
use crate::paths::resolve_location;
use crate::{AppError, Result};

/// Result of a start request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was created.
    Started(SessionId),
    /// A session with this name is already running; nothing changed.
    AlreadyRunning,
}

impl Orchestrator {
    /// Start the session described by `spec`.
    ///
    /// Inline `commands` win over `location`. When the manifest at
    /// `location` is used, its resolved path is watched afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingCommands` if the spec has neither commands
    /// nor location, and manifest, workspace, terminal or watch errors
    /// otherwise. On error no session or watch is left behind.
    pub fn start(&mut self, spec: &SessionSpec) -> Result<StartOutcome> {
        let _span = info_span!("start_session", session = %spec.name).entered();

        if self.sessions.contains(&spec.name) {
            info!("session already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let (commands, watched) = self.resolve_commands(spec)?;
        let working_dir = self.config.workspace_root.clone();
        let id = match self.open_session(&spec.name, SessionTag::Configured, working_dir, &commands)? {
            Admission::Created(id) => id,
            Admission::AlreadyExists => return Ok(StartOutcome::AlreadyRunning),
        };

        if let Some(path) = watched {
            if let Err(err) = self.watches.arm(&path, &spec.name) {
                warn!(%err, "rolling back session without its watch");
                self.sessions.remove(&spec.name);
                return Err(err);
            }
        }

        info!(%id, commands = commands.len(), "session started");
        Ok(StartOutcome::Started(id))
    }

    /// [`Self::start`], surfacing the outcome to the user.
    pub fn start_and_report(&mut self, spec: &SessionSpec) -> Option<StartOutcome> {
        match self.start(spec) {
            Ok(StartOutcome::AlreadyRunning) => {
                self.notify(
                    NoticeLevel::Info,
                    &format!("Session '{}' is already running.", spec.name),
                );
                Some(StartOutcome::AlreadyRunning)
            }
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(session = %spec.name, %err, "session start failed");
                self.report(&err);
                None
            }
        }
    }

    /// Stop `name` and release its watches. Stopping an absent name is a no-op.
    ///
    /// A watch shared with another session stays armed for that session.
    /// Returns whether a running session was removed.
    pub fn stop(&mut self, name: &str) -> bool {
        let _span = info_span!("stop_session", session = name).entered();
        let removed = self.sessions.remove(name);
        let watches = self.watches.release(name);
        if removed {
            info!(watches, "session stopped");
        } else {
            debug!(watches, "stop requested for a session that is not running");
        }
        removed
    }

    /// Commands for `spec` and, when they came from a manifest, its resolved path.
    fn resolve_commands(&self, spec: &SessionSpec) -> Result<(Vec<String>, Option<PathBuf>)> {
        if !spec.commands.is_empty() {
            return Ok((spec.commands.clone(), None));
        }
        let Some(ref location) = spec.location else {
            return Err(AppError::MissingCommands(format!(
                "session '{}' declares neither commands nor location",
                spec.name
            )));
        };
        let path = resolve_location(self.config.workspace_root(), location)?;
        let commands = manifest::read_commands(&path)?;
        Ok((commands, Some(path)))
    }

    /// Register a session under `name`, show it and feed it `lines` in order.
    pub(crate) fn open_session(
        &mut self,
        name: &str,
        tag: SessionTag,
        working_dir: Option<PathBuf>,
        lines: &[String],
    ) -> Result<Admission> {
        let dialect = self.dialect;
        let terminals = &mut self.terminals;
        let admission = self.sessions.try_create(name, tag, |id| {
            terminals.create(&TerminalRequest {
                name: name.to_owned(),
                id,
                working_dir,
                dialect,
            })
        })?;
        if let Admission::Created(_) = admission {
            self.feed(name, lines);
        }
        Ok(admission)
    }

    /// Register a session under `name`, disposing a live holder first, then feed it.
    pub(crate) fn replace_session(
        &mut self,
        name: &str,
        tag: SessionTag,
        working_dir: Option<PathBuf>,
        lines: &[String],
    ) -> Result<SessionId> {
        let dialect = self.dialect;
        let terminals = &mut self.terminals;
        let id = self.sessions.replace(name, tag, |id| {
            terminals.create(&TerminalRequest {
                name: name.to_owned(),
                id,
                working_dir,
                dialect,
            })
        })?;
        // The replaced session may have owned watches under this name.
        self.watches.release(name);
        self.feed(name, lines);
        Ok(id)
    }

    pub(crate) fn feed(&mut self, name: &str, lines: &[String]) {
        let Some(entry) = self.sessions.get_mut(name) else {
            return;
        };
        let terminal = entry.terminal_mut();
        terminal.show();
        for line in lines {
            terminal.send_text(line);
        }
    }

    pub(crate) fn on_file_changed(&mut self, path: &Path, watch: WatchId) {
        let owners = self.watches.current_owners(path, watch);
        if owners.is_empty() {
            debug!(path = %path.display(), %watch, "ignoring change from a stale watch");
            return;
        }

        for owner in owners {
            let _span =
                info_span!("manifest_changed", session = %owner, path = %path.display()).entered();
            self.notify(
                NoticeLevel::Info,
                &format!("Commands file for session '{owner}' changed; restarting it."),
            );
            // The watch stays armed; a successful start re-arms it.
            self.sessions.remove(&owner);
            self.start_and_report(&SessionSpec::with_location(owner, path));
        }
    }

    pub(crate) fn on_file_deleted(&mut self, path: &Path, watch: WatchId) {
        let owners = self.watches.current_owners(path, watch);
        if owners.is_empty() {
            debug!(path = %path.display(), %watch, "ignoring deletion from a stale watch");
            return;
        }

        for owner in &owners {
            let _span =
                info_span!("manifest_deleted", session = %owner, path = %path.display()).entered();
            self.notify(
                NoticeLevel::Warning,
                &format!(
                    "Commands file '{}' was deleted; stopping session '{owner}'.",
                    path.display()
                ),
            );
            self.stop(owner);
        }
        self.watches.disarm(path);
    }

    pub(crate) fn on_session_closed(&mut self, name: &str, id: SessionId) {
        if self.sessions.release_closed(name, id) {
            let watches = self.watches.release(name);
            info!(session = name, %id, watches, "session closed by host; unregistered");
        } else {
            debug!(session = name, %id, "closure of an instance that is no longer registered");
        }
    }
}
