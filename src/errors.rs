//! Error types shared across the orchestrator.

use std::fmt::{Display, Formatter};

use crate::host::NoticeLevel;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Manifest could not be parsed or has the wrong shape.
    Manifest(String),
    /// Requested file, directory, session, module or script does not exist.
    NotFound(String),
    /// A session spec declares neither `commands` nor `location`.
    MissingCommands(String),
    /// A location-based operation ran without a workspace root.
    NoWorkspace(String),
    /// The interactive session primitive could not be created.
    Terminal(String),
    /// The file-watch primitive could not be installed.
    Watch(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Notification level used when this error is surfaced to the user.
    #[must_use]
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            Self::MissingCommands(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Manifest(msg) => write!(f, "manifest: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::MissingCommands(msg) => write!(f, "missing commands: {msg}"),
            Self::NoWorkspace(msg) => write!(f, "no workspace: {msg}"),
            Self::Terminal(msg) => write!(f, "terminal: {msg}"),
            Self::Watch(msg) => write!(f, "watch: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<notify::Error> for AppError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}
