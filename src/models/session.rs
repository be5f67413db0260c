//! Runtime session identity and ownership tags.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity of one concrete session instance.
///
/// Names are reused after disposal; ids never are, so late closure events
/// from a previous instance can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a running session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionTag {
    /// Started from a `[[session]]` entry (or restarted by its file watch).
    Configured,
    /// A single module script run in isolation.
    ModuleScript {
        /// Owning module name.
        module: String,
        /// Script key from the module manifest.
        script: String,
    },
    /// The chained `run_scripts` of a module.
    ModuleChain {
        /// Owning module name.
        module: String,
    },
}

impl SessionTag {
    /// Session name for a single module script.
    #[must_use]
    pub fn module_script_name(module: &str, script: &str) -> String {
        format!("{module} - {script}")
    }

    /// Session name for a module chain.
    #[must_use]
    pub fn module_chain_name(module: &str) -> String {
        format!("[Module] {module}")
    }

    /// Owning module, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Configured => None,
            Self::ModuleScript { module, .. } | Self::ModuleChain { module } => Some(module),
        }
    }
}

impl Display for SessionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configured => write!(f, "configured"),
            Self::ModuleScript { module, script } => write!(f, "module {module} script {script}"),
            Self::ModuleChain { module } => write!(f, "module {module} chain"),
        }
    }
}

/// Read-only view of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Registered name.
    pub name: String,
    /// Instance identity.
    pub id: SessionId,
    /// Ownership tag.
    pub tag: SessionTag,
    /// When the instance was registered.
    pub started_at: DateTime<Utc>,
}
