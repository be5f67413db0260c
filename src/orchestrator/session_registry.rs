//! Name → live session table.
//!
//! The registry is the single source of truth for which sessions are
//! running. Admission checks the name and registers the new handle in one
//! `&mut self` call, so no other start or stop can interleave between the
//! existence check and the registration.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::host::Terminal;
use crate::models::{SessionId, SessionSummary, SessionTag};
use crate::Result;

/// Outcome of asking the registry for a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new session was created and registered under the name.
    Created(SessionId),
    /// A live session already holds the name; nothing changed.
    AlreadyExists,
}

/// One registered session.
pub struct SessionEntry {
    id: SessionId,
    tag: SessionTag,
    started_at: DateTime<Utc>,
    terminal: Box<dyn Terminal>,
}

impl SessionEntry {
    /// Instance identity.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Ownership tag.
    #[must_use]
    pub fn tag(&self) -> &SessionTag {
        &self.tag
    }

    /// The underlying session handle.
    pub fn terminal_mut(&mut self) -> &mut dyn Terminal {
        self.terminal.as_mut()
    }
}

/// Registry of running sessions keyed by name.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, SessionEntry>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session under `name` unless the name is taken.
    ///
    /// `create` builds the handle for the freshly assigned id; it only runs
    /// when the name is free.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`; the registry is left unchanged.
    pub fn try_create<F>(&mut self, name: &str, tag: SessionTag, create: F) -> Result<Admission>
    where
        F: FnOnce(SessionId) -> Result<Box<dyn Terminal>>,
    {
        if self.sessions.contains_key(name) {
            debug!(session = name, "name already registered");
            return Ok(Admission::AlreadyExists);
        }
        let id = self.insert(name, tag, create)?;
        Ok(Admission::Created(id))
    }

    /// Register a new session under `name`, disposing any live holder first.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`. The previous holder is disposed
    /// either way.
    pub fn replace<F>(&mut self, name: &str, tag: SessionTag, create: F) -> Result<SessionId>
    where
        F: FnOnce(SessionId) -> Result<Box<dyn Terminal>>,
    {
        if self.remove(name) {
            info!(session = name, "replaced running session");
        }
        self.insert(name, tag, create)
    }

    fn insert<F>(&mut self, name: &str, tag: SessionTag, create: F) -> Result<SessionId>
    where
        F: FnOnce(SessionId) -> Result<Box<dyn Terminal>>,
    {
        let id = SessionId::new();
        let terminal = create(id)?;
        self.sessions.insert(
            name.to_owned(),
            SessionEntry {
                id,
                tag,
                started_at: Utc::now(),
                terminal,
            },
        );
        Ok(id)
    }

    /// Look up a running session.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SessionEntry> {
        self.sessions.get(name)
    }

    /// Look up a running session for feeding it input.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SessionEntry> {
        self.sessions.get_mut(name)
    }

    /// Whether a session is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Dispose and unregister `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.sessions.remove(name) {
            Some(mut entry) => {
                entry.terminal.dispose();
                true
            }
            None => false,
        }
    }

    /// Unregister `name` after the host reported instance `id` closed.
    ///
    /// A report for an older instance of a reused name is ignored.
    pub fn release_closed(&mut self, name: &str, id: SessionId) -> bool {
        if self.sessions.get(name).is_some_and(|entry| entry.id == id) {
            self.remove(name)
        } else {
            false
        }
    }

    /// Dispose every session and clear the table. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let count = self.sessions.len();
        for (_, mut entry) in self.sessions.drain() {
            entry.terminal.dispose();
        }
        count
    }

    /// Number of running sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Running session names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Running session names whose tag satisfies `filter`, sorted.
    #[must_use]
    pub fn names_where<F>(&self, filter: F) -> Vec<String>
    where
        F: Fn(&SessionTag) -> bool,
    {
        let mut names: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, entry)| filter(&entry.tag))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Snapshot of every running session, sorted by name.
    #[must_use]
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut out: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|(name, entry)| SessionSummary {
                name: name.clone(),
                id: entry.id,
                tag: entry.tag.clone(),
                started_at: entry.started_at,
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
