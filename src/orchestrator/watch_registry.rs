//! Path → file watch table for file-sourced sessions.
//!
//! Watches are keyed by resolved absolute path, so sessions sharing a
//! manifest share one watch and every session arming it is recorded as an
//! owner. Arming a path that is already watched replaces the old watch;
//! there is never more than one live watch per path. A watch is disposed
//! once its last owner releases it. Every arming gets a fresh [`WatchId`]
//! so events from a disposed watch can be recognised and dropped.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::host::{FileWatch, WatchHost};
use crate::Result;

/// Identity of one arming of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl Display for WatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

struct WatchEntry {
    id: WatchId,
    owners: BTreeSet<String>,
    handle: Box<dyn FileWatch>,
}

/// Registry of active file watches.
pub struct WatchRegistry {
    host: Box<dyn WatchHost>,
    watches: HashMap<PathBuf, WatchEntry>,
    next_id: u64,
}

impl WatchRegistry {
    /// Create an empty registry installing watches through `host`.
    #[must_use]
    pub fn new(host: Box<dyn WatchHost>) -> Self {
        Self {
            host,
            watches: HashMap::new(),
            next_id: 0,
        }
    }

    /// Watch `path` on behalf of session `owner`, replacing any existing watch.
    ///
    /// Owners of the replaced watch carry over to the new arming.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Watch` if the host cannot install the watch. The
    /// previous watch for `path`, if any, is left in place.
    pub fn arm(&mut self, path: &Path, owner: &str) -> Result<WatchId> {
        self.next_id += 1;
        let id = WatchId(self.next_id);
        let handle = self.host.watch(path, id)?;

        let mut owners = BTreeSet::new();
        if let Some(mut previous) = self.watches.remove(path) {
            debug!(path = %path.display(), previous = %previous.id, "replacing existing watch");
            previous.handle.dispose();
            owners = previous.owners;
        }
        owners.insert(owner.to_owned());

        self.watches
            .insert(path.to_path_buf(), WatchEntry { id, owners, handle });
        info!(path = %path.display(), session = owner, %id, "watch armed");
        Ok(id)
    }

    /// Dispose the watch for `path`. Returns whether one existed.
    pub fn disarm(&mut self, path: &Path) -> bool {
        match self.watches.remove(path) {
            Some(mut entry) => {
                entry.handle.dispose();
                true
            }
            None => false,
        }
    }

    /// Drop `owner` from every watch, disposing watches left with no owner.
    ///
    /// Returns how many watches were disposed.
    pub fn release(&mut self, owner: &str) -> usize {
        let mut orphaned = Vec::new();
        for (path, entry) in &mut self.watches {
            if entry.owners.remove(owner) && entry.owners.is_empty() {
                orphaned.push(path.clone());
            }
        }
        for path in &orphaned {
            self.disarm(path);
        }
        orphaned.len()
    }

    /// Owners of the watch on `path`, if `id` is still the live arming.
    ///
    /// Empty when the event came from a disposed or replaced arming.
    #[must_use]
    pub fn current_owners(&self, path: &Path, id: WatchId) -> Vec<String> {
        self.watches
            .get(path)
            .filter(|entry| entry.id == id)
            .map_or_else(Vec::new, |entry| entry.owners.iter().cloned().collect())
    }

    /// Owners of the watch on `path`, sorted, whichever arming it is.
    #[must_use]
    pub fn owners(&self, path: &Path) -> Vec<&str> {
        self.watches
            .get(path)
            .map_or_else(Vec::new, |entry| {
                entry.owners.iter().map(String::as_str).collect()
            })
    }

    /// Whether `path` is watched.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.watches.contains_key(path)
    }

    /// Dispose every watch. Returns how many were removed.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.watches.len();
        for (_, mut entry) in self.watches.drain() {
            entry.handle.dispose();
        }
        count
    }

    /// Number of live watches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether no watch is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Watched paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.watches.keys().cloned().collect();
        paths.sort();
        paths
    }
}
