//! Location resolution against the workspace root.
//!
//! Relative locations are joined to the single workspace root; absolute
//! locations pass through. Both are normalized lexically so that
//! `api/./commands.json` and `api/commands.json` map to the same watch key.

use std::path::{Component, Path, PathBuf};

use crate::{AppError, Result};

/// Resolve `location` into an absolute, normalized path.
///
/// # Errors
///
/// Returns `AppError::NoWorkspace` if `location` is relative and no
/// workspace root is available.
pub fn resolve_location(workspace_root: Option<&Path>, location: impl AsRef<Path>) -> Result<PathBuf> {
    let location = location.as_ref();
    if location.is_absolute() {
        return Ok(normalize(location));
    }

    let root = workspace_root.ok_or_else(|| {
        AppError::NoWorkspace(format!(
            "cannot resolve '{}' without an open workspace root",
            location.display()
        ))
    })?;
    Ok(normalize(&root.join(location)))
}

/// Remove `.` segments and fold `..` into its parent, without touching the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Popping past the root is a no-op, like the OS does.
                normalized.pop();
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
        }
    }
    normalized
}
