//! Structured logger with dry-run awareness and summary collection.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{ComponentEntry, ComponentStatus, Log};
use super::utils::{log_file_path, terminal_columns};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/dotstate/<command>.log` (default `~/.cache/dotstate/<command>.log`)
/// with timestamps and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<ComponentEntry>>,
    log_file: Option<PathBuf>,
    /// Whether a progress line is currently displayed.
    ///
    /// The progress line is always truncated to a single terminal row so it
    /// can be erased with `\r` plus erase-line, without cursor movement.
    progress_shown: Mutex<bool>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary.  The log file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
            progress_shown: Mutex::new(false),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<ComponentEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        self.clear_progress();
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        self.clear_progress();
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        self.clear_progress();
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        self.clear_progress();
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        self.clear_progress();
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        self.clear_progress();
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a component result for the summary.
    pub fn record(&self, entry: ComponentEntry) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(entry);
        }
    }

    /// Return `true` if any recorded component has failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Count the number of failed components.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|e| e.status == ComponentStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded components.
    ///
    /// The count line is printed even when nothing was recorded.  Failed
    /// components are followed by their captured command output.
    pub fn print_summary(&self) {
        let entries = self.entries();

        println!();
        self.stage("Summary");

        let mut success = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for entry in &entries {
            let (icon, color) = match entry.status {
                ComponentStatus::Success => {
                    success += 1;
                    ("✓", "\x1b[32m")
                }
                ComponentStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[2m")
                }
                ComponentStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                ComponentStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));

            if let Some(output) = &entry.output {
                for line in output.lines() {
                    self.info(&format!("    \x1b[2m│ {line}\x1b[0m"));
                }
            }
        }

        println!();
        let total = success + skipped + dry_run + failed;
        self.info(&format!(
            "{total} components: \x1b[32m{success} succeeded\x1b[0m, \x1b[2m{skipped} skipped\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Erase the in-progress status line from the console.
    ///
    /// No-op if no progress line is currently shown.
    fn clear_progress(&self) {
        let mut shown = self
            .progress_shown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *shown {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            *shown = false;
        }
    }

    /// Print an in-progress status line naming `name`, truncated to one
    /// terminal row.
    fn draw_progress(&self, name: &str) {
        self.clear_progress();
        let cols = terminal_columns();
        let prefix_width = 4;
        let max_chars = cols.saturating_sub(prefix_width);
        let display = if name.chars().count() > max_chars {
            let truncated: String = name.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{truncated}…")
        } else {
            name.to_string()
        };
        print!("  \x1b[2m▹ {display}\x1b[0m");
        std::io::stdout().flush().ok();
        let mut shown = self
            .progress_shown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *shown = true;
    }

    #[cfg(test)]
    fn progress_visible(&self) -> bool {
        *self
            .progress_shown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, entry: ComponentEntry) {
        self.record(entry);
    }

    fn progress(&self, name: &str) {
        self.draw_progress(name);
    }

    fn before_interactive(&self) {
        self.clear_progress();
    }

    fn after_interactive(&self) {
        std::io::stdout().flush().ok();
    }
}
