//! Hot-reload watcher for `shellherd.toml`.
//!
//! [`ConfigWatcher`] uses the `notify` crate to watch the configuration
//! file. When it changes, the whole file is re-parsed and validated; a
//! valid snapshot is sent to the orchestrator as
//! [`Event::ConfigChanged`], which decides between an incremental reload
//! and a full reset. An invalid file is logged and the previous snapshot
//! stays in force.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use shellherd::config_watcher::ConfigWatcher;
//!
//! let (tx, _rx) = shellherd::events::channel();
//! let watcher = ConfigWatcher::new(Path::new("shellherd.toml"), None, tx).expect("watcher");
//! // keep `watcher` alive for as long as hot-reload is wanted
//! ```

use std::path::{Path, PathBuf};

use notify::{Event as FsEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::config::WorkspaceConfig;
use crate::events::{Event, EventSender};
use crate::{AppError, Result};

/// Re-read `path`, applying the command-line workspace override if any.
///
/// Without an override, a file that names no `workspace_root` is rooted at
/// its own directory. The fallback is decided on every read, so adding a
/// root to the file later takes effect on the next reload.
///
/// # Errors
///
/// Returns `AppError::Config` if the file cannot be read, parsed or validated.
pub fn reload_config(path: &Path, workspace_override: Option<&Path>) -> Result<WorkspaceConfig> {
    let mut config = WorkspaceConfig::load_from_path(path)?;
    if let Some(root) = workspace_override {
        config.set_workspace_root(root)?;
    } else if config.workspace_root.is_none() {
        config.set_workspace_root(config_dir(path))?;
    }
    Ok(config)
}

/// Directory holding the configuration file.
fn config_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| p != &Path::new(""))
        .unwrap_or(Path::new("."))
}

/// Returns `true` for file-system events that write, replace or remove `path`.
fn is_config_change(event: &FsEvent, path: &Path) -> bool {
    let Some(file_name) = path.file_name() else {
        return false;
    };
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == file_name))
}

/// Hot-reload watcher for the configuration file.
///
/// Dropping a `ConfigWatcher` stops the underlying OS watch, so callers
/// must keep it alive for as long as hot-reload is needed.
pub struct ConfigWatcher {
    /// Underlying notify watcher, kept alive by owning it here.
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Watch `config_path` and send every valid new snapshot on `events`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Watch` if the `notify` watcher itself cannot be
    /// created or attached.
    pub fn new(
        config_path: &Path,
        workspace_override: Option<PathBuf>,
        events: EventSender,
    ) -> Result<Self> {
        let path_for_callback = config_path.to_path_buf();

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<FsEvent, notify::Error>| match result {
                Ok(event) if is_config_change(&event, &path_for_callback) => {
                    if !path_for_callback.exists() {
                        warn!(
                            path = %path_for_callback.display(),
                            "config file removed; keeping previous configuration"
                        );
                        return;
                    }
                    match reload_config(&path_for_callback, workspace_override.as_deref()) {
                        Ok(config) => {
                            info!(path = %path_for_callback.display(), "config file changed");
                            let _ = events.send(Event::ConfigChanged(Box::new(config)));
                        }
                        Err(err) => {
                            warn!(
                                %err,
                                path = %path_for_callback.display(),
                                "failed to reload config; keeping previous configuration"
                            );
                        }
                    }
                }
                Err(err) => {
                    warn!(%err, "config file watcher error");
                }
                _ => {}
            },
        )
        .map_err(|err| AppError::Watch(format!("failed to create config file watcher: {err}")))?;

        // Watch the directory so rename-based saves are detected.
        let watch_target = config_dir(config_path);

        watcher
            .watch(watch_target, RecursiveMode::NonRecursive)
            .map_err(|err| {
                AppError::Watch(format!(
                    "failed to watch config path '{}': {err}",
                    watch_target.display()
                ))
            })?;

        info!(path = %config_path.display(), "config watcher started");

        Ok(Self {
            _watcher: watcher,
            path: config_path.to_path_buf(),
        })
    }

    /// Path of the watched configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
