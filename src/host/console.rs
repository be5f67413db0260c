//! Console notifications and argument-driven pickers for the binary.

use std::collections::VecDeque;
use std::io::Write;

use tracing::{error, info, warn};

use crate::host::{NoticeLevel, Notifier, PickItem, Picker};

/// Prints notifications to stdout and mirrors them into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => {
                info!(notice = message, "user notice");
                "info"
            }
            NoticeLevel::Warning => {
                warn!(notice = message, "user notice");
                "warning"
            }
            NoticeLevel::Error => {
                error!(notice = message, "user notice");
                "error"
            }
        };
        let mut out = std::io::stdout().lock();
        // stdout gone means nobody is listening; the log line above remains.
        let _ = writeln!(out, "[{tag}] {message}");
    }
}

/// Answers a command's prompts from its positional arguments.
///
/// `run-module-script svc build` answers the module prompt with `svc` and
/// the script prompt with `build`. Answers that are not among the offered
/// labels are dropped; running out of answers means nothing was chosen, and
/// the offered labels are printed so the user can retry with one.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPicker {
    answers: VecDeque<String>,
}

impl ScriptedPicker {
    /// Picker that hands out `answers` in order.
    #[must_use]
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    fn offer(placeholder: &str, items: &[PickItem]) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{placeholder}:");
        for item in items {
            if item.description.is_empty() {
                let _ = writeln!(out, "  {}", item.label);
            } else {
                let _ = writeln!(out, "  {}  ({})", item.label, item.description);
            }
        }
    }
}

fn offered(items: &[PickItem], answer: &str) -> bool {
    items.iter().any(|item| item.label == answer)
}

impl Picker for ScriptedPicker {
    fn pick_one(&mut self, placeholder: &str, items: &[PickItem]) -> Option<String> {
        match self.answers.pop_front() {
            Some(answer) if offered(items, &answer) => Some(answer),
            Some(answer) => {
                warn!(answer = %answer, placeholder, "answer is not among the offered items");
                Self::offer(placeholder, items);
                None
            }
            None => {
                Self::offer(placeholder, items);
                None
            }
        }
    }

    fn pick_many(&mut self, placeholder: &str, items: &[PickItem]) -> Vec<String> {
        if self.answers.is_empty() {
            Self::offer(placeholder, items);
            return Vec::new();
        }
        self.answers
            .drain(..)
            .filter(|answer| {
                let ok = offered(items, answer);
                if !ok {
                    warn!(answer = %answer, placeholder, "answer is not among the offered items");
                }
                ok
            })
            .collect()
    }
}
