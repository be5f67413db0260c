//! Declared intent: sessions, groups and modules as read from configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// A named interactive session the user wants to be able to start.
///
/// Commands come either from `commands` (used verbatim, in order) or from
/// the `commands` array of the manifest at `location`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SessionSpec {
    /// Unique key within one configuration.
    pub name: String,
    /// Shell commands fed to the session in declaration order.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Manifest file supplying commands, relative to the workspace root.
    #[serde(default)]
    pub location: Option<PathBuf>,
    /// Whether `start-all` and reloads start this session.
    #[serde(default)]
    pub auto_start: bool,
}

impl SessionSpec {
    /// Spec with inline commands and no manifest.
    #[must_use]
    pub fn with_commands<I, S>(name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            commands: commands.into_iter().map(Into::into).collect(),
            location: None,
            auto_start: false,
        }
    }

    /// Spec whose commands are read from the manifest at `location`.
    #[must_use]
    pub fn with_location(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            location: Some(location.into()),
            auto_start: false,
        }
    }

    /// Builder-style toggle for `auto_start`.
    #[must_use]
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Short human-readable summary used as a picker description.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.commands.is_empty() {
            self.location
                .as_ref()
                .map_or_else(String::new, |path| path.display().to_string())
        } else {
            self.commands.join("; ")
        }
    }
}

/// A named ordered list of session names. Groups have no lifecycle of their own.
pub type GroupSpec = Vec<String>;

fn default_manifest() -> String {
    "package.json".into()
}

/// A directory with a script manifest whose scripts can be run or chained.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ModuleSpec {
    /// Module name, used in session names and pickers.
    pub name: String,
    /// Module directory, relative to the workspace root.
    pub location: PathBuf,
    /// Manifest file name inside the module directory.
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Script keys chained in order; empty means single-script mode.
    #[serde(default)]
    pub run_scripts: Vec<String>,
    /// Extra flags appended to every script invocation.
    #[serde(default)]
    pub command: String,
    /// Close the session after every script succeeded.
    #[serde(default)]
    pub auto_close: bool,
    /// Close the session as soon as one script fails.
    #[serde(default)]
    pub auto_close_when_fail: bool,
}

impl ModuleSpec {
    /// Module in single-script mode with default policies.
    #[must_use]
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            manifest: default_manifest(),
            run_scripts: Vec::new(),
            command: String::new(),
            auto_close: false,
            auto_close_when_fail: false,
        }
    }

    /// Whether this module chains `run_scripts` instead of running one picked script.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        !self.run_scripts.is_empty()
    }
}
