//! User command handlers.
//!
//! Each command gathers its choices through a [`Picker`], then applies them
//! item by item: a failure on one item is reported and the rest still run.

use tracing::{info, info_span};

use crate::commands::CommandId;
use crate::host::{NoticeLevel, PickItem, Picker};
use crate::models::{SessionSpec, SessionTag};
use crate::orchestrator::lifecycle::StartOutcome;
use crate::orchestrator::Orchestrator;

const NOTHING_SELECTED: &str = "No sessions selected.";

impl Orchestrator {
    /// Run `command`, asking `picker` for any choices it needs.
    pub fn execute(&mut self, command: CommandId, picker: &mut dyn Picker) {
        let _span = info_span!("command", command = %command).entered();
        info!("executing command");
        match command {
            CommandId::StartAll => self.start_all(),
            CommandId::StartSelected => self.start_selected(picker),
            CommandId::StopSelected => self.stop_selected(picker),
            CommandId::StopAll => self.stop_all(),
            CommandId::StartOne => self.start_one(picker),
            CommandId::StopOne => self.stop_one(picker),
            CommandId::StartGroup => self.start_group(picker),
            CommandId::StopGroup => self.stop_group(picker),
            CommandId::RunModuleScript => self.pick_and_run_module_script(picker),
            CommandId::RunChainedModuleScripts => self.pick_and_run_module_chain(picker),
            CommandId::StopModuleScript => self.stop_tagged(picker, |tag| {
                matches!(tag, SessionTag::ModuleScript { .. })
            }),
            CommandId::StopChainedModuleScripts => self.stop_tagged(picker, |tag| {
                matches!(tag, SessionTag::ModuleChain { .. })
            }),
            CommandId::ListSessions => self.list_sessions(),
            CommandId::ReloadAll => {
                self.reset_sessions();
            }
        }
    }

    /// Start every configured session with `auto_start`.
    pub fn start_all(&mut self) {
        let specs: Vec<SessionSpec> = self
            .config
            .sessions
            .iter()
            .filter(|spec| spec.auto_start)
            .cloned()
            .collect();
        for spec in &specs {
            self.start_and_report(spec);
        }
    }

    /// Stop every running session, whoever started it.
    pub fn stop_all(&mut self) {
        for name in self.sessions.names() {
            self.stop(&name);
        }
    }

    fn session_items(&self) -> Vec<PickItem> {
        self.config
            .sessions
            .iter()
            .map(|spec| PickItem::described(&spec.name, spec.describe()))
            .collect()
    }

    fn running_items(&self, names: Vec<String>) -> Vec<PickItem> {
        names
            .into_iter()
            .map(|name| {
                let description = self
                    .sessions
                    .get(&name)
                    .map_or_else(String::new, |entry| entry.tag().to_string());
                PickItem::described(name, description)
            })
            .collect()
    }

    fn start_by_name(&mut self, name: &str) {
        match self.config.session(name).cloned() {
            Some(spec) => {
                self.start_and_report(&spec);
            }
            None => self.notify(NoticeLevel::Error, &format!("Session not found: {name}")),
        }
    }

    fn start_selected(&mut self, picker: &mut dyn Picker) {
        let chosen = picker.pick_many("Select sessions to start", &self.session_items());
        if chosen.is_empty() {
            self.notify(NoticeLevel::Info, NOTHING_SELECTED);
            return;
        }
        for name in chosen {
            self.start_by_name(&name);
        }
    }

    fn stop_selected(&mut self, picker: &mut dyn Picker) {
        if self.sessions.is_empty() {
            self.notify(NoticeLevel::Info, "No sessions are running.");
            return;
        }
        let items = self.running_items(self.sessions.names());
        let chosen = picker.pick_many("Select sessions to stop", &items);
        if chosen.is_empty() {
            self.notify(NoticeLevel::Info, NOTHING_SELECTED);
            return;
        }
        for name in chosen {
            self.stop(&name);
        }
    }

    fn start_one(&mut self, picker: &mut dyn Picker) {
        if let Some(name) = picker.pick_one("Select a session to start", &self.session_items()) {
            self.start_by_name(&name);
        }
    }

    fn stop_one(&mut self, picker: &mut dyn Picker) {
        let items = self.running_items(self.sessions.names());
        if let Some(name) = picker.pick_one("Select a session to stop", &items) {
            self.stop(&name);
        }
    }

    fn pick_group(&mut self, picker: &mut dyn Picker, placeholder: &str) -> Option<Vec<String>> {
        if self.config.groups.is_empty() {
            self.notify(NoticeLevel::Warning, "No session groups are defined.");
            return None;
        }
        let items: Vec<PickItem> = self
            .config
            .groups
            .iter()
            .map(|(name, members)| PickItem::described(name, members.join(", ")))
            .collect();
        let group = picker.pick_one(placeholder, &items)?;
        self.config.group(&group).cloned()
    }

    fn start_group(&mut self, picker: &mut dyn Picker) {
        let Some(members) = self.pick_group(picker, "Select a group to start") else {
            return;
        };
        for name in members {
            self.start_by_name(&name);
        }
    }

    fn stop_group(&mut self, picker: &mut dyn Picker) {
        let Some(members) = self.pick_group(picker, "Select a group to stop") else {
            return;
        };
        for name in members {
            if !self.stop(&name) {
                self.notify(
                    NoticeLevel::Info,
                    &format!("Session '{name}' is not running."),
                );
            }
        }
    }

    fn module_items(&self, chained: bool) -> Vec<PickItem> {
        self.config
            .modules
            .iter()
            .filter(|module| module.is_chained() == chained)
            .map(|module| {
                let description = if chained {
                    module.run_scripts.join(" → ")
                } else {
                    module.location.display().to_string()
                };
                PickItem::described(&module.name, description)
            })
            .collect()
    }

    fn pick_and_run_module_script(&mut self, picker: &mut dyn Picker) {
        let items = self.module_items(false);
        if items.is_empty() {
            self.notify(NoticeLevel::Warning, "No single-script modules are defined.");
            return;
        }
        let Some(module_name) = picker.pick_one("Select a module", &items) else {
            return;
        };

        let resolved = match self
            .module_spec(&module_name)
            .and_then(|module| self.resolve_module(&module))
        {
            Ok(resolved) => resolved,
            Err(err) => {
                self.report(&err);
                return;
            }
        };
        let scripts: Vec<PickItem> = resolved
            .scripts
            .iter()
            .map(|(key, command)| PickItem::described(key, command))
            .collect();
        let Some(script) = picker.pick_one("Select a script to run", &scripts) else {
            return;
        };

        match self.run_module_script(&module_name, &script) {
            Ok(StartOutcome::Started(_)) => {}
            Ok(StartOutcome::AlreadyRunning) => self.notify(
                NoticeLevel::Info,
                &format!(
                    "Session '{}' is already running.",
                    SessionTag::module_script_name(&module_name, &script)
                ),
            ),
            Err(err) => self.report(&err),
        }
    }

    fn pick_and_run_module_chain(&mut self, picker: &mut dyn Picker) {
        let items = self.module_items(true);
        if items.is_empty() {
            self.notify(NoticeLevel::Warning, "No modules with run_scripts are defined.");
            return;
        }
        let Some(module_name) = picker.pick_one("Select a module to run", &items) else {
            return;
        };
        if let Err(err) = self.run_module_chain(&module_name) {
            self.report(&err);
        }
    }

    fn stop_tagged<F>(&mut self, picker: &mut dyn Picker, filter: F)
    where
        F: Fn(&SessionTag) -> bool,
    {
        let names = self.sessions.names_where(filter);
        if names.is_empty() {
            self.notify(NoticeLevel::Info, "No module sessions are running.");
            return;
        }
        let items = self.running_items(names);
        let chosen = picker.pick_many("Select module sessions to stop", &items);
        if chosen.is_empty() {
            self.notify(NoticeLevel::Info, NOTHING_SELECTED);
            return;
        }
        for name in chosen {
            self.stop(&name);
        }
    }

    fn list_sessions(&self) {
        let summaries = self.sessions.summaries();
        if summaries.is_empty() {
            self.notify(NoticeLevel::Info, "No sessions are running.");
            return;
        }
        let lines: Vec<String> = summaries
            .iter()
            .map(|s| {
                format!(
                    "{} ({}, since {})",
                    s.name,
                    s.tag,
                    s.started_at.format("%H:%M:%S")
                )
            })
            .collect();
        self.notify(
            NoticeLevel::Info,
            &format!("{} running: {}", summaries.len(), lines.join("; ")),
        );
    }
}
