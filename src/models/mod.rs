//! Domain model module declarations.

pub mod session;
pub mod spec;

pub use session::{SessionId, SessionSummary, SessionTag};
pub use spec::{GroupSpec, ModuleSpec, SessionSpec};
