//! Convergence engine: bring each resolved component to its declared state,
//! then uninstall what disappeared from the configuration.
//!
//! The engine owns the [`StateStore`] for the duration of a run.  Components
//! are processed strictly in order; a component failure is recorded on its
//! [`ComponentResult`] and never aborts the batch.  Only lock-file I/O
//! errors end a run early.
mod context;
mod converge;
mod hooks;
mod uninstall;

pub use context::{Context, RunOptions, home_dir};

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::profiles::ResolvedComponent;
use crate::error::{ComponentError, StateError};
use crate::logging::{ComponentEntry, ComponentStatus};
use crate::resources::Applicable as _;
use crate::resources::command::CommandResource;
use crate::state::{StateStore, split_identity};

/// Outcome of processing one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentResult {
    /// Component identity (`<profile>.<name>`).
    pub identity: String,
    /// Final status.
    pub status: ComponentStatus,
    /// What was done, or why nothing was.
    pub message: Option<String>,
    /// The failure, for [`ComponentStatus::Failed`].
    pub error: Option<ComponentError>,
}

impl ComponentResult {
    /// A non-failed result.
    #[must_use]
    pub fn new(identity: &str, status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            identity: identity.to_string(),
            status,
            message,
            error: None,
        }
    }

    /// A failed result carrying `error`.
    #[must_use]
    pub fn failed(identity: &str, error: ComponentError) -> Self {
        Self {
            identity: identity.to_string(),
            status: ComponentStatus::Failed,
            message: Some(error.to_string()),
            error: Some(error),
        }
    }

    /// Summary entry for the logger.
    #[must_use]
    pub fn entry(&self) -> ComponentEntry {
        let mut entry = ComponentEntry::new(&self.identity, self.status, self.message.as_deref());
        entry.output = self
            .error
            .as_ref()
            .and_then(ComponentError::output)
            .map(String::from);
        entry
    }
}

/// Every result of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-component results.
    pub results: Vec<ComponentResult>,
}

impl RunReport {
    /// Result for `identity`, if it was processed.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&ComponentResult> {
        self.results.iter().find(|r| r.identity == identity)
    }

    /// Number of results with `status`.
    #[must_use]
    pub fn count(&self, status: ComponentStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Whether any component failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.count(ComponentStatus::Failed) > 0
    }
}

/// Applies resolved components against the persisted state.
#[derive(Debug)]
pub struct Engine {
    ctx: Context,
    state: StateStore,
}

impl Engine {
    /// Create an engine that owns `state` for the run.
    #[must_use]
    pub const fn new(ctx: Context, state: StateStore) -> Self {
        Self { ctx, state }
    }

    /// Current state, including changes made so far.
    #[must_use]
    pub const fn state(&self) -> &StateStore {
        &self.state
    }

    /// Give the state store back (for inspection after a run).
    #[must_use]
    pub fn into_state(self) -> StateStore {
        self.state
    }

    /// Converge `selected`, then uninstall tracked components whose identity
    /// is not in `current`.
    ///
    /// `current` should come from the unfiltered resolution, so narrowing a
    /// run with fuzzy terms never uninstalls anything.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the lock file cannot be written.
    pub fn run(
        &mut self,
        selected: &[ResolvedComponent],
        current: &[String],
    ) -> Result<RunReport, StateError> {
        let mut report = RunReport::default();

        self.ctx.log.stage("Converging components");
        for component in selected {
            let result = self.converge(component);
            self.finish(result, &mut report)?;
        }

        let removed = self.state.removed_components(current);
        if !removed.is_empty() {
            self.ctx.log.stage("Removing unconfigured components");
            let claimed = self.configured_destinations(current);
            for entry in removed {
                let result = self.uninstall(&entry, &claimed);
                self.finish(result, &mut report)?;
            }
        }

        self.save()?;
        Ok(report)
    }

    /// Uninstall the tracked components named by `identities`.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the lock file cannot be written.
    pub fn uninstall_tracked(&mut self, identities: &[String]) -> Result<RunReport, StateError> {
        let mut report = RunReport::default();
        self.ctx.log.stage("Uninstalling components");
        let claimed = self.tracked_destinations(identities);
        for id in identities {
            let Some(entry) = self.state.get(id).cloned() else {
                self.ctx.log.debug(&format!("{id}: not tracked"));
                continue;
            };
            let result = self.uninstall(&entry, &claimed);
            self.finish(result, &mut report)?;
        }
        self.save()?;
        Ok(report)
    }

    /// Run lifecycle hooks of `components` regardless of what changed.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the lock file cannot be written.
    pub fn run_hooks(&mut self, components: &[ResolvedComponent]) -> Result<RunReport, StateError> {
        let mut report = RunReport::default();
        self.ctx.log.stage("Running hooks");
        for component in components {
            let result = self.hooks(component);
            self.finish(result, &mut report)?;
        }
        self.save()?;
        Ok(report)
    }

    /// Link destinations declared by the configured components `current`.
    ///
    /// A component that was renamed or moved to another profile shows up as
    /// removed under its old identity while its links now belong to the new
    /// one; those destinations must survive the uninstall pass.
    fn configured_destinations(&self, current: &[String]) -> BTreeSet<PathBuf> {
        let linker = self.ctx.linker();
        current
            .iter()
            .filter_map(|id| {
                let (profile, name) = split_identity(id);
                self.ctx.config.find_component(profile, name)
            })
            .flat_map(|component| component.link.values())
            .map(|dest| linker.dest_path(dest))
            .collect()
    }

    /// Link destinations recorded for tracked components outside `leaving`.
    fn tracked_destinations(&self, leaving: &[String]) -> BTreeSet<PathBuf> {
        let linker = self.ctx.linker();
        self.state
            .entries()
            .filter(|entry| !leaving.contains(&entry.identity()))
            .flat_map(|entry| entry.links.values())
            .map(|dest| linker.dest_path(dest))
            .collect()
    }

    /// Log and record `result`, then persist whatever it changed.
    fn finish(&mut self, result: ComponentResult, report: &mut RunReport) -> Result<(), StateError> {
        match result.status {
            ComponentStatus::Failed => self.ctx.log.error(&format!(
                "{}: {}",
                result.identity,
                result.message.as_deref().unwrap_or("failed")
            )),
            ComponentStatus::Success => self.ctx.log.info(&format!(
                "{}: {}",
                result.identity,
                result.message.as_deref().unwrap_or("done")
            )),
            ComponentStatus::Skipped | ComponentStatus::DryRun => {
                self.ctx.log.debug(&format!("{}: {}", result.identity, result.status));
            }
        }
        self.ctx.log.record(result.entry());
        report.results.push(result);
        self.save()
    }

    fn save(&mut self) -> Result<(), StateError> {
        if self.ctx.dry_run() {
            return Ok(());
        }
        if self.state.save()? {
            self.ctx
                .log
                .debug(&format!("saved {}", self.state.path().display()));
        }
        Ok(())
    }

    /// Run a shell command for `stage`, attaching the terminal when the
    /// interactive predicate says so.
    fn run_command(&self, stage: &str, command: &str) -> Result<(), ComponentError> {
        let interactive = (self.ctx.interactive)(command);
        CommandResource::new(stage, command, &*self.ctx.executor, &*self.ctx.log)
            .interactive(interactive)
            .apply()
            .map(|_| ())
            .map_err(|e| {
                e.downcast::<ComponentError>()
                    .unwrap_or_else(|e| ComponentError::CommandFailed {
                        stage: stage.to_string(),
                        command: command.to_string(),
                        code: -1,
                        output: format!("{e:#}"),
                    })
            })
    }
}

/// Comma-separated manager names of a command table, for error messages.
fn tried(table: &std::collections::BTreeMap<String, String>) -> String {
    table.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
