//! Workspace configuration parsing and validation.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::models::{GroupSpec, ModuleSpec, SessionSpec};
use crate::{AppError, Result};

fn default_script_runner() -> String {
    "npm".into()
}

/// Configuration snapshot parsed from `shellherd.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// Root that relative `location`s are resolved against.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    /// Program invoked as `<runner> run <script> <flags>` for module scripts.
    #[serde(default = "default_script_runner")]
    pub script_runner: String,
    /// Declared sessions, in file order.
    #[serde(default, rename = "session")]
    pub sessions: Vec<SessionSpec>,
    /// Named groups of session names.
    #[serde(default)]
    pub groups: BTreeMap<String, GroupSpec>,
    /// Declared modules, in file order.
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            script_runner: default_script_runner(),
            sessions: Vec::new(),
            groups: BTreeMap::new(),
            modules: Vec::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the workspace root, canonicalizing it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the directory does not exist.
    pub fn set_workspace_root(&mut self, root: &Path) -> Result<()> {
        let canonical = root
            .canonicalize()
            .map_err(|err| AppError::Config(format!("workspace_root invalid: {err}")))?;
        self.workspace_root = Some(canonical);
        Ok(())
    }

    /// Absolute workspace root, if one is configured.
    #[must_use]
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Look up a session spec by name.
    #[must_use]
    pub fn session(&self, name: &str) -> Option<&SessionSpec> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// Look up a module spec by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Look up a group's member names.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&GroupSpec> {
        self.groups.get(name)
    }

    fn validate(&mut self) -> Result<()> {
        if self.script_runner.trim().is_empty() {
            return Err(AppError::Config("script_runner must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for spec in &self.sessions {
            if spec.name.trim().is_empty() {
                return Err(AppError::Config("session name must not be empty".into()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate session name '{}'",
                    spec.name
                )));
            }
            if spec.commands.is_empty() && spec.location.is_none() {
                warn!(
                    session = %spec.name,
                    "session declares neither commands nor location; it cannot be started"
                );
            }
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(AppError::Config("module name must not be empty".into()));
            }
            if module.location.as_os_str().is_empty() {
                return Err(AppError::Config(format!(
                    "module '{}' must declare a location",
                    module.name
                )));
            }
            if !seen.insert(module.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate module name '{}'",
                    module.name
                )));
            }
        }

        for (group, members) in &self.groups {
            for member in members {
                if self.session(member).is_none() {
                    warn!(group = %group, session = %member, "group references an undeclared session");
                }
            }
        }

        if let Some(root) = self.workspace_root.take() {
            self.set_workspace_root(&root)?;
        }

        Ok(())
    }
}
