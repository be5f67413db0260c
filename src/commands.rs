//! User-facing command identifiers and their parsed invocations.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{AppError, Result};

/// Every operation the orchestrator exposes to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// Start every session with `auto_start = true`.
    StartAll,
    /// Pick any number of declared sessions and start them.
    StartSelected,
    /// Pick any number of running sessions and stop them.
    StopSelected,
    /// Stop every running session.
    StopAll,
    /// Pick one declared session and start it.
    StartOne,
    /// Pick one running session and stop it.
    StopOne,
    /// Pick a group and start its members.
    StartGroup,
    /// Pick a group and stop its members.
    StopGroup,
    /// Pick a single-script module and one of its scripts, and run it.
    RunModuleScript,
    /// Pick a chained module and run its script chain.
    RunChainedModuleScripts,
    /// Pick running single module scripts and stop them.
    StopModuleScript,
    /// Pick running module chains and stop them.
    StopChainedModuleScripts,
    /// Report every running session.
    ListSessions,
    /// Tear everything down and start the auto-start sessions afresh.
    ReloadAll,
}

impl CommandId {
    /// All commands, in help order.
    pub const ALL: [Self; 14] = [
        Self::StartAll,
        Self::StartSelected,
        Self::StopSelected,
        Self::StopAll,
        Self::StartOne,
        Self::StopOne,
        Self::StartGroup,
        Self::StopGroup,
        Self::RunModuleScript,
        Self::RunChainedModuleScripts,
        Self::StopModuleScript,
        Self::StopChainedModuleScripts,
        Self::ListSessions,
        Self::ReloadAll,
    ];

    /// Stable identifier used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartAll => "start-all",
            Self::StartSelected => "start-selected",
            Self::StopSelected => "stop-selected",
            Self::StopAll => "stop-all",
            Self::StartOne => "start-one",
            Self::StopOne => "stop-one",
            Self::StartGroup => "start-group",
            Self::StopGroup => "stop-group",
            Self::RunModuleScript => "run-module-script",
            Self::RunChainedModuleScripts => "run-chained-module-scripts",
            Self::StopModuleScript => "stop-module-script",
            Self::StopChainedModuleScripts => "stop-chained-module-scripts",
            Self::ListSessions => "list-sessions",
            Self::ReloadAll => "reload-all",
        }
    }
}

impl Display for CommandId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| AppError::Config(format!("unknown command '{s}'")))
    }
}

/// A command plus the answers for the prompts it will raise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Which operation to run.
    pub command: CommandId,
    /// Picker answers, consumed in prompt order.
    pub answers: Vec<String>,
}

impl Invocation {
    /// Invocation without picker answers.
    #[must_use]
    pub fn new(command: CommandId) -> Self {
        Self {
            command,
            answers: Vec::new(),
        }
    }

    /// Parse a line: `<command-id> [answer…]`.
    ///
    /// Answers are whitespace separated; wrap an answer in double quotes to
    /// keep its spaces (`stop-module-script "svc - build"`). Returns
    /// `Ok(None)` for a blank line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the command identifier is unknown or a
    /// quote is left open.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = split_words(line)?.into_iter();
        let Some(first) = words.next() else {
            return Ok(None);
        };
        Ok(Some(Self {
            command: first.parse()?,
            answers: words.collect(),
        }))
    }
}

fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err(AppError::Config(format!("unterminated quote in '{line}'")));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
