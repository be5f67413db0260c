//! Script manifest reader.
//!
//! A manifest is a JSON document carrying either a flat `commands` array
//! (session manifests) or a `scripts` object mapping script keys to shell
//! commands (module manifests, e.g. `package.json`). Missing files, malformed
//! JSON and wrong shapes surface as distinct errors.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::{AppError, Result};

/// Parsed manifest document.
#[derive(Debug, Clone)]
pub struct Manifest {
    raw: Value,
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the file does not exist,
    /// `AppError::Io` if it cannot be read and `AppError::Manifest` if it is
    /// not valid JSON.
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                AppError::NotFound(format!("manifest '{}' does not exist", path.display()))
            } else {
                AppError::Io(format!("failed to read manifest '{}': {err}", path.display()))
            }
        })?;
        debug!(path = %path.display(), bytes = raw.len(), "read manifest");
        Self::parse(&raw).map_err(|err| match err {
            AppError::Manifest(msg) => AppError::Manifest(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse a manifest from a string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Manifest` if `raw` is not valid JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(raw)
            .map_err(|err| AppError::Manifest(format!("invalid JSON: {err}")))?;
        Ok(Self { raw })
    }

    /// The `commands` array, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Manifest` if `commands` is missing or is not an
    /// array of strings.
    pub fn commands(&self) -> Result<Vec<String>> {
        let Some(Value::Array(items)) = self.raw.get("commands") else {
            return Err(AppError::Manifest(
                "expected a \"commands\" array of strings".into(),
            ));
        };
        items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    AppError::Manifest(format!("\"commands\" entry {item} is not a string"))
                })
            })
            .collect()
    }

    /// The `scripts` mapping, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Manifest` if `scripts` is missing or is not an
    /// object of strings.
    pub fn scripts(&self) -> Result<BTreeMap<String, String>> {
        let Some(Value::Object(map)) = self.raw.get("scripts") else {
            return Err(AppError::Manifest(
                "expected a \"scripts\" object".into(),
            ));
        };
        map.iter()
            .map(|(key, value)| {
                value
                    .as_str()
                    .map(|cmd| (key.clone(), cmd.to_owned()))
                    .ok_or_else(|| {
                        AppError::Manifest(format!("script \"{key}\" is not a string"))
                    })
            })
            .collect()
    }
}

/// Read the `commands` array of the manifest at `path`.
///
/// # Errors
///
/// See [`Manifest::read`] and [`Manifest::commands`].
pub fn read_commands(path: &Path) -> Result<Vec<String>> {
    Manifest::read(path)?.commands()
}

/// Read the `scripts` mapping of the manifest at `path`.
///
/// # Errors
///
/// See [`Manifest::read`] and [`Manifest::scripts`].
pub fn read_scripts(path: &Path) -> Result<BTreeMap<String, String>> {
    Manifest::read(path)?.scripts()
}
