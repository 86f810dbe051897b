//! Shell command execution.
//!
//! Every command the engine runs (install, uninstall, hooks, `defaults`) is a
//! shell string handed to an [`Executor`].  [`SystemExecutor`] is the real
//! implementation; tests substitute scripted or mocked executors.
use anyhow::{Context as _, Result};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

/// Result of a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (empty for interactive runs).
    pub stdout: String,
    /// Captured standard error (empty for interactive runs).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Stdout and stderr joined, trimmed, for failure reports.
    #[must_use]
    pub fn combined_output(&self) -> String {
        let out = self.stdout.trim();
        let err = self.stderr.trim();
        match (out.is_empty(), err.is_empty()) {
            (true, _) => err.to_string(),
            (false, true) => out.to_string(),
            (false, false) => format!("{out}\n{err}"),
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs shell command strings and looks programs up on PATH.
///
/// A non-zero exit is reported through [`ExecResult::success`], not as an
/// `Err`; `Err` means the shell itself could not be spawned.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `command` through the shell, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell process cannot be spawned.
    fn run(&self, command: &str) -> Result<ExecResult>;

    /// Run `command` through the shell with stdin/stdout/stderr attached to
    /// the controlling terminal, so the user can answer prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell process cannot be spawned.
    fn run_interactive(&self, command: &str) -> Result<ExecResult>;

    /// Whether an executable named `program` exists on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Build the platform shell invocation for `command`.
fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Production [`Executor`] backed by [`std::process`] and the `which` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, command: &str) -> Result<ExecResult> {
        let output = shell(command)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute: {command}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, command: &str) -> Result<ExecResult> {
        let status = shell(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("failed to execute: {command}"))?;
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Quote `arg` for inclusion in a shell command string.
///
/// Arguments made only of safe characters are returned unchanged.
#[must_use]
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Decides whether a command needs the controlling terminal.
///
/// Injected into the engine so tests can make the choice deterministic
/// instead of relying on command-text sniffing.
pub type InteractivePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Substrings that mark a command as (probably) prompting the user.
const INTERACTIVE_MARKERS: &[&str] = &["sudo", "passwd", "chsh", "ssh-keygen", "ssh-add"];

/// Best-effort heuristic: does `command` look like it will prompt?
#[must_use]
pub fn looks_interactive(command: &str) -> bool {
    INTERACTIVE_MARKERS.iter().any(|m| command.contains(m))
}

/// The default [`InteractivePredicate`], wrapping [`looks_interactive`].
#[must_use]
pub fn default_interactive_predicate() -> InteractivePredicate {
    Arc::new(looks_interactive)
}

/// An [`InteractivePredicate`] that never attaches the terminal.
#[must_use]
pub fn never_interactive() -> InteractivePredicate {
    Arc::new(|_: &str| false)
}
