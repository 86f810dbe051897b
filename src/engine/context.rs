use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::exec::{Executor, InteractivePredicate, default_interactive_predicate};
use crate::logging::Log;
use crate::platform::Platform;
use crate::resources::symlink::Linker;

/// Switches that change what a run does, not what it decides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report effectful steps instead of performing them.
    pub dry_run: bool,
    /// Treat every component as needing install.
    pub force_install: bool,
    /// Move conflicting link destinations aside instead of failing.
    pub backup_conflicts: bool,
}

/// Shared context for a convergence run.
pub struct Context {
    /// The loaded declarative model.
    pub config: Arc<Config>,
    /// Detected (or simulated) host.
    pub platform: Platform,
    /// Logger for output and component recording.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// User's home directory path.
    pub home: PathBuf,
    /// Run switches.
    pub options: RunOptions,
    /// Decides which commands get the terminal.
    pub interactive: InteractivePredicate,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config.file)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("home", &self.home)
            .field("options", &self.options)
            .field("interactive", &"<predicate>")
            .finish()
    }
}

impl Context {
    /// Creates a new context, reading the home directory from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME (or USERPROFILE on Windows) environment variable
    /// is not set.
    pub fn new(
        config: Arc<Config>,
        platform: Platform,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        options: RunOptions,
    ) -> Result<Self> {
        Ok(Self::with_home(
            config,
            platform,
            log,
            executor,
            options,
            home_dir()?,
        ))
    }

    /// Creates a new context with an explicit home directory.
    #[must_use]
    pub fn with_home(
        config: Arc<Config>,
        platform: Platform,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
        options: RunOptions,
        home: PathBuf,
    ) -> Self {
        Self {
            config,
            platform,
            log,
            executor,
            home,
            options,
            interactive: default_interactive_predicate(),
        }
    }

    /// Replace the interactive-command predicate.
    #[must_use]
    pub fn with_interactive(mut self, interactive: InteractivePredicate) -> Self {
        self.interactive = interactive;
        self
    }

    /// Whether effectful steps are only reported.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Linker resolving sources against the repository root and
    /// destinations against the home directory.
    #[must_use]
    pub fn linker(&self) -> Linker {
        Linker::new(
            self.config.root.clone(),
            self.home.clone(),
            self.options.backup_conflicts,
        )
    }
}

/// The user's home directory.
///
/// # Errors
///
/// Returns an error if neither HOME nor (on Windows) USERPROFILE is set.
pub fn home_dir() -> Result<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .map_err(|_| anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set"))?
    } else {
        std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?
    };
    Ok(PathBuf::from(home))
}
