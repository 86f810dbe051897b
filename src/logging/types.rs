//! Core logging types: component entries, status, and the [`Log`] trait.
use std::fmt;

/// Per-component result for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    /// Component identity (`<profile>.<component>`).
    pub name: String,
    /// Final status of the component.
    pub status: ComponentStatus,
    /// Optional detail message (e.g., what was done, or the error).
    pub message: Option<String>,
    /// Captured command output for failures.
    pub output: Option<String>,
}

impl ComponentEntry {
    /// Build an entry without captured output.
    #[must_use]
    pub fn new(name: &str, status: ComponentStatus, message: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.map(String::from),
            output: None,
        }
    }
}

/// Outcome of converging one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    /// At least one action was performed and all succeeded.
    Success,
    /// Nothing needed to be done.
    Skipped,
    /// Some step failed; later steps for this component were not attempted.
    Failed,
    /// Actions were needed but only reported.
    DryRun,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::DryRun => "dry-run",
        })
    }
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes to the console and log file;
/// [`MemoryLog`](super::memory::MemoryLog) captures everything for
/// inspection.  Engine code logs through this trait only.
pub trait Log: Send + Sync + fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a component result for the summary.
    fn record(&self, entry: ComponentEntry);
    /// Show `name` as the component currently being processed.
    fn progress(&self, _name: &str) {}
    /// Called synchronously before a command takes over the terminal.
    fn before_interactive(&self) {}
    /// Called synchronously after a terminal-attached command exits.
    fn after_interactive(&self) {}
}
