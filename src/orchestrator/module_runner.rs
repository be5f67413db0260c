//! Module script runs.
//!
//! A single script runs in a session named `"<module> - <script>"` and is
//! rejected while that session is alive. A chain renders every
//! `run_scripts` entry into one script for the host dialect and runs it in
//! `"[Module] <module>"`, replacing a live session of that name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, info_span};

use crate::manifest;
use crate::models::{ModuleSpec, SessionId, SessionTag};
use crate::orchestrator::lifecycle::StartOutcome;
use crate::orchestrator::session_registry::Admission;
use crate::orchestrator::Orchestrator;
use crate::paths::resolve_location;
use crate::script::{compose_chain, script_invocation, ChainPolicy};
use crate::{AppError, Result};

/// A module whose directory and manifest were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Absolute module directory.
    pub dir: PathBuf,
    /// Absolute manifest path.
    pub manifest: PathBuf,
    /// Script key → command from the manifest.
    pub scripts: BTreeMap<String, String>,
}

impl Orchestrator {
    /// Look up `name` among the configured modules.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no module has that name.
    pub fn module_spec(&self, name: &str) -> Result<ModuleSpec> {
        self.config
            .module(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("module '{name}' is not configured")))
    }

    /// Check that `module`'s directory exists and its manifest has `scripts`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NoWorkspace`, `AppError::NotFound` or
    /// `AppError::Manifest` describing the first problem found.
    pub fn resolve_module(&self, module: &ModuleSpec) -> Result<ResolvedModule> {
        let dir = resolve_location(self.config.workspace_root(), &module.location)?;
        if !dir.is_dir() {
            return Err(AppError::NotFound(format!(
                "module directory '{}' does not exist",
                dir.display()
            )));
        }
        let manifest = dir.join(&module.manifest);
        let scripts = manifest::read_scripts(&manifest)?;
        Ok(ResolvedModule {
            dir,
            manifest,
            scripts,
        })
    }

    /// Run one script of `module_name` on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the module is unknown or invalid, the script key
    /// is not in its manifest, or the session cannot be created.
    pub fn run_module_script(&mut self, module_name: &str, script: &str) -> Result<StartOutcome> {
        let _span = info_span!("run_module_script", module = module_name, script).entered();
        let module = self.module_spec(module_name)?;
        let resolved = self.resolve_module(&module)?;
        if !resolved.scripts.contains_key(script) {
            return Err(AppError::NotFound(format!(
                "script '{script}' is not defined in '{}'",
                resolved.manifest.display()
            )));
        }

        let name = SessionTag::module_script_name(&module.name, script);
        let line = script_invocation(&self.config.script_runner, script, &module.command);
        let tag = SessionTag::ModuleScript {
            module: module.name.clone(),
            script: script.to_owned(),
        };
        match self.open_session(&name, tag, Some(resolved.dir), &[line])? {
            Admission::Created(id) => {
                info!(session = %name, %id, "module script started");
                Ok(StartOutcome::Started(id))
            }
            Admission::AlreadyExists => {
                info!(session = %name, "module script already running");
                Ok(StartOutcome::AlreadyRunning)
            }
        }
    }

    /// Run the `run_scripts` chain of `module_name` in one session.
    ///
    /// A live chain session for the module is disposed and recreated.
    ///
    /// # Errors
    ///
    /// Returns an error if the module is unknown, has no `run_scripts`, is
    /// invalid, or the session cannot be created.
    pub fn run_module_chain(&mut self, module_name: &str) -> Result<SessionId> {
        let _span = info_span!("run_module_chain", module = module_name).entered();
        let module = self.module_spec(module_name)?;
        if !module.is_chained() {
            return Err(AppError::Config(format!(
                "module '{}' declares no run_scripts",
                module.name
            )));
        }
        let resolved = self.resolve_module(&module)?;

        let policy = ChainPolicy {
            close_on_failure: module.auto_close_when_fail,
            close_on_success: module.auto_close,
        };
        let script = compose_chain(
            self.dialect,
            &self.config.script_runner,
            &module.run_scripts,
            &module.command,
            policy,
        );

        let name = SessionTag::module_chain_name(&module.name);
        let tag = SessionTag::ModuleChain {
            module: module.name.clone(),
        };
        let id = self.replace_session(&name, tag, Some(resolved.dir), &[script])?;

        info!(
            session = %name,
            %id,
            steps = module.run_scripts.len(),
            ?policy,
            "module chain started"
        );
        Ok(id)
    }
}
