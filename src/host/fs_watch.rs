//! `notify`-backed file watches for session manifests.
//!
//! The parent directory is watched rather than the file itself so that
//! rename-based saves (write to temp + rename) are seen. Events are filtered
//! down to the watched file name and forwarded to the orchestrator.

use std::path::{Path, PathBuf};

use notify::{Event as FsEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::events::{Event, EventSender};
use crate::host::{FileWatch, WatchHost};
use crate::orchestrator::watch_registry::WatchId;
use crate::{AppError, Result};

/// Installs one `notify` watcher per watched file.
pub struct NotifyWatchHost {
    events: EventSender,
}

impl NotifyWatchHost {
    /// Create a host that forwards file events on `events`.
    #[must_use]
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

/// What a raw file-system event means for the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Changed,
    Deleted,
}

fn classify(event: &FsEvent, path: &Path) -> Option<Observed> {
    let file_name = path.file_name()?;
    let touches_file = event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == file_name));
    if !touches_file {
        return None;
    }

    match event.kind {
        // Remove followed by create at the same path is an atomic save, so the
        // file's presence decides rather than the event kind.
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
            if path.exists() {
                Some(Observed::Changed)
            } else {
                Some(Observed::Deleted)
            }
        }
        _ => None,
    }
}

impl WatchHost for NotifyWatchHost {
    fn watch(&mut self, path: &Path, id: WatchId) -> Result<Box<dyn FileWatch>> {
        let events = self.events.clone();
        let watched: PathBuf = path.to_path_buf();

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<FsEvent, notify::Error>| match result {
                Ok(event) => {
                    let Some(observed) = classify(&event, &watched) else {
                        return;
                    };
                    debug!(path = %watched.display(), ?observed, %id, "manifest event");
                    let event = match observed {
                        Observed::Changed => Event::FileChanged {
                            path: watched.clone(),
                            watch: id,
                        },
                        Observed::Deleted => Event::FileDeleted {
                            path: watched.clone(),
                            watch: id,
                        },
                    };
                    let _ = events.send(event);
                }
                Err(err) => {
                    warn!(%err, path = %watched.display(), "file watcher error");
                }
            },
        )
        .map_err(|err| AppError::Watch(format!("failed to create watcher: {err}")))?;

        let target = path
            .parent()
            .filter(|p| p != &Path::new(""))
            .unwrap_or(path);
        watcher
            .watch(target, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::Watch(format!(
                    "failed to watch '{}': {err}",
                    target.display()
                ))
            })?;

        info!(path = %path.display(), %id, "manifest watch installed");
        Ok(Box::new(NotifyFileWatch {
            watcher: Some(watcher),
        }))
    }
}

/// Owns the underlying watcher; dropping it stops the OS watch.
struct NotifyFileWatch {
    watcher: Option<RecommendedWatcher>,
}

impl FileWatch for NotifyFileWatch {
    fn dispose(&mut self) {
        self.watcher.take();
    }
}
