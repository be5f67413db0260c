//! Configuration reloads.
//!
//! The incremental path diffs the previous and current session specs by
//! name and touches only what changed. The full reset disposes everything
//! and starts the auto-start sessions from the new snapshot.

use std::collections::HashMap;

use tracing::{debug, info, info_span};

use crate::config::WorkspaceConfig;
use crate::host::NoticeLevel;
use crate::models::SessionSpec;
use crate::orchestrator::lifecycle::StartOutcome;
use crate::orchestrator::Orchestrator;

/// Difference between two session spec lists, compared by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiff {
    /// Specs whose name is new.
    pub added: Vec<SessionSpec>,
    /// Names that disappeared.
    pub removed: Vec<String>,
    /// New versions of specs that differ from their previous value.
    pub changed: Vec<SessionSpec>,
    /// Names whose spec is identical.
    pub unchanged: Vec<String>,
}

impl SessionDiff {
    /// Whether nothing was added, removed or changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare `previous` against `current`.
#[must_use]
pub fn diff_sessions(previous: &[SessionSpec], current: &[SessionSpec]) -> SessionDiff {
    let before: HashMap<&str, &SessionSpec> =
        previous.iter().map(|spec| (spec.name.as_str(), spec)).collect();
    let after: HashMap<&str, &SessionSpec> =
        current.iter().map(|spec| (spec.name.as_str(), spec)).collect();

    let mut diff = SessionDiff::default();
    for spec in previous {
        if !after.contains_key(spec.name.as_str()) {
            diff.removed.push(spec.name.clone());
        }
    }
    for spec in current {
        match before.get(spec.name.as_str()) {
            None => diff.added.push(spec.clone()),
            Some(old) if *old != spec => diff.changed.push(spec.clone()),
            Some(_) => diff.unchanged.push(spec.name.clone()),
        }
    }
    diff
}

/// Counts from one reload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// New specs.
    pub added: usize,
    /// Specs whose value changed.
    pub changed: usize,
    /// Specs that disappeared.
    pub removed: usize,
    /// Sessions started during the pass.
    pub started: usize,
}

impl Orchestrator {
    /// Apply the difference between `previous` and `current` session specs.
    ///
    /// Removed sessions are stopped. Changed sessions are stopped and started
    /// again only when their new spec has `auto_start`. Added sessions start
    /// when they have `auto_start`. Unchanged sessions are not touched.
    pub fn reload_sessions(
        &mut self,
        previous: &[SessionSpec],
        current: &[SessionSpec],
    ) -> ReloadReport {
        let _span = info_span!("reload_sessions").entered();
        let diff = diff_sessions(previous, current);
        let mut report = ReloadReport {
            added: diff.added.len(),
            changed: diff.changed.len(),
            removed: diff.removed.len(),
            started: 0,
        };

        for name in &diff.removed {
            self.stop(name);
        }
        for spec in &diff.changed {
            self.stop(&spec.name);
            if spec.auto_start && self.start_counted(spec) {
                report.started += 1;
            }
        }
        for spec in &diff.added {
            if spec.auto_start && self.start_counted(spec) {
                report.started += 1;
            }
        }

        info!(
            added = report.added,
            changed = report.changed,
            removed = report.removed,
            started = report.started,
            unchanged = diff.unchanged.len(),
            "sessions reloaded"
        );
        self.notify(
            NoticeLevel::Info,
            &format!(
                "Configuration reloaded: {} changed, {} removed, {} added.",
                report.changed, report.removed, report.added
            ),
        );
        report
    }

    /// Dispose every session and watch, then start the auto-start sessions.
    ///
    /// Returns how many sessions were started.
    pub fn reset_sessions(&mut self) -> usize {
        let _span = info_span!("reset_sessions").entered();
        let stopped = self.sessions.remove_all();
        let unwatched = self.watches.dispose_all();

        let specs: Vec<SessionSpec> = self
            .config
            .sessions
            .iter()
            .filter(|spec| spec.auto_start)
            .cloned()
            .collect();
        let started = specs.iter().filter(|spec| self.start_counted(spec)).count();

        info!(stopped, unwatched, started, "sessions reset");
        self.notify(
            NoticeLevel::Info,
            &format!("Sessions reset: {stopped} stopped, {started} started."),
        );
        started
    }

    /// Replace the configuration snapshot and reconcile running sessions.
    ///
    /// A new workspace root changes every resolved path, so it triggers a
    /// full reset; otherwise only session spec changes are reconciled.
    pub fn apply_config(&mut self, next: WorkspaceConfig) {
        if next == self.config {
            debug!("configuration unchanged");
            return;
        }

        let previous = std::mem::replace(&mut self.config, next);
        if previous.workspace_root != self.config.workspace_root {
            info!(
                from = ?previous.workspace_root,
                to = ?self.config.workspace_root,
                "workspace root changed; resetting all sessions"
            );
            self.reset_sessions();
            return;
        }

        if previous.sessions != self.config.sessions {
            let current = self.config.sessions.clone();
            self.reload_sessions(&previous.sessions, &current);
        }
        if previous.groups != self.config.groups {
            info!(groups = self.config.groups.len(), "session groups updated");
        }
        if previous.modules != self.config.modules || previous.script_runner != self.config.script_runner {
            info!(modules = self.config.modules.len(), "module definitions updated");
        }
    }

    fn start_counted(&mut self, spec: &SessionSpec) -> bool {
        matches!(self.start_and_report(spec), Some(StartOutcome::Started(_)))
    }
}
