//! In-memory logger that captures messages and component entries.
use std::sync::Mutex;

use super::types::{ComponentEntry, Log};

/// A single captured log message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// A stage header.
    Stage(String),
    /// An informational message.
    Info(String),
    /// A debug message.
    Debug(String),
    /// A warning.
    Warn(String),
    /// An error.
    Error(String),
    /// A dry-run action.
    DryRun(String),
    /// Marker for [`Log::before_interactive`].
    BeforeInteractive,
    /// Marker for [`Log::after_interactive`].
    AfterInteractive,
}

impl LogLine {
    /// Message text, empty for markers.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Stage(m)
            | Self::Info(m)
            | Self::Debug(m)
            | Self::Warn(m)
            | Self::Error(m)
            | Self::DryRun(m) => m,
            Self::BeforeInteractive | Self::AfterInteractive => "",
        }
    }
}

/// Push each display message into `self.lines` as the matching [`LogLine`]
/// variant and mirror it to `tracing` at debug level.
macro_rules! capture_log_methods {
    ($($method:ident => $variant:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                tracing::debug!("{msg}");
                if let Ok(mut guard) = self.lines.lock() {
                    guard.push(LogLine::$variant(msg.to_string()));
                }
            }
        )+
    };
}

/// Logger that keeps everything in memory.
///
/// Used where console output is unwanted (library embedding, tests); the
/// captured lines and entries can be inspected afterwards.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<LogLine>>,
    entries: Mutex<Vec<ComponentEntry>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every captured message, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Every recorded component entry, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<ComponentEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Whether any captured message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.text().contains(needle))
    }
}

impl Log for MemoryLog {
    capture_log_methods! {
        stage   => Stage,
        info    => Info,
        debug   => Debug,
        warn    => Warn,
        error   => Error,
        dry_run => DryRun,
    }

    fn record(&self, entry: ComponentEntry) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(entry);
        }
    }

    fn before_interactive(&self) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(LogLine::BeforeInteractive);
        }
    }

    fn after_interactive(&self) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(LogLine::AfterInteractive);
        }
    }
}
