//! Shell script generation for chained module scripts.
//!
//! A chain is rendered as one script body: one invocation line per script
//! key, an optional exit guard after each, and an optional final exit.

/// Shell dialect a generated script targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    /// `sh`, `bash`, `zsh` and friends.
    Posix,
    /// Windows `PowerShell`.
    PowerShell,
}

impl ShellDialect {
    /// Dialect of the platform this binary was built for.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }

    /// Program and arguments for a shell reading commands from stdin.
    ///
    /// Commands share that stdin with the shell; see [`Self::detach_stdin`].
    #[must_use]
    pub fn program(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Posix => ("sh", &["-s"]),
            Self::PowerShell => ("powershell", &["-NoLogo", "-NoProfile", "-Command", "-"]),
        }
    }

    /// Wrap `text` so the commands in it read stdin from the null device.
    ///
    /// Otherwise a step that reads stdin consumes the lines queued behind it.
    /// `PowerShell` text is returned unchanged, so there a step reading stdin
    /// can still swallow queued lines.
    #[must_use]
    pub fn detach_stdin(self, text: &str) -> String {
        match self {
            Self::Posix if !text.trim().is_empty() => format!("{{\n{text}\n}} </dev/null"),
            _ => text.to_owned(),
        }
    }

    /// Line that exits the shell when the previous command failed.
    #[must_use]
    pub fn exit_on_failure(self) -> &'static str {
        match self {
            Self::Posix => "if [ $? -ne 0 ]; then exit 1; fi",
            Self::PowerShell => "if ($LASTEXITCODE -ne 0) { exit $LASTEXITCODE }",
        }
    }

    /// Line that exits the shell unconditionally.
    #[must_use]
    pub fn exit_success(self) -> &'static str {
        "exit 0"
    }
}

/// What happens to the session once the chain finishes or fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainPolicy {
    /// Exit after every step that fails.
    pub close_on_failure: bool,
    /// Exit after the last step.
    pub close_on_success: bool,
}

/// Invocation line for one script: `<runner> run <script> <flags>`.
#[must_use]
pub fn script_invocation(runner: &str, script: &str, flags: &str) -> String {
    let flags = flags.trim();
    if flags.is_empty() {
        format!("{runner} run {script}")
    } else {
        format!("{runner} run {script} {flags}")
    }
}

/// Render the chain for `scripts` as one script body, one statement per line.
#[must_use]
pub fn compose_chain(
    dialect: ShellDialect,
    runner: &str,
    scripts: &[String],
    flags: &str,
    policy: ChainPolicy,
) -> String {
    let mut lines = Vec::with_capacity(scripts.len() * 2 + 1);
    for script in scripts {
        lines.push(script_invocation(runner, script, flags));
        if policy.close_on_failure {
            lines.push(dialect.exit_on_failure().to_owned());
        }
    }
    if policy.close_on_success {
        lines.push(dialect.exit_success().to_owned());
    }
    lines.join("\n")
}
