//! Defaults command: sync macOS preference domains with repository files.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::cli::{DefaultsAction, DefaultsOpts, GlobalOpts};
use crate::config::profiles::ResolvedComponent;
use crate::engine::{ComponentResult, RunReport};
use crate::error::ComponentError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{ComponentStatus, Log, Logger};
use crate::platform::Platform;
use crate::resources::defaults::{DEFAULTS_PROGRAM, PreferencesResource};
use crate::resources::{Applicable as _, Resource as _, ResourceState};

/// Apply `action` to every preference domain of `components`.
///
/// Does nothing (and returns no results) off macOS or without the
/// `defaults` executable.
#[must_use]
pub fn sync(
    components: &[ResolvedComponent],
    action: DefaultsAction,
    root: &Path,
    platform: &Platform,
    executor: &dyn Executor,
    dry_run: bool,
    log: &dyn Log,
) -> RunReport {
    let mut report = RunReport::default();
    if !platform.is_darwin() || !executor.which(DEFAULTS_PROGRAM) {
        log.warn("preferences sync needs macOS and the `defaults` tool; nothing to do");
        return report;
    }

    for component in components {
        let id = component.identity();
        for (domain, file) in &component.component.defaults {
            let prefs = PreferencesResource::new(domain.clone(), root.join(file), executor);
            let result = sync_domain(&prefs, action, dry_run, log);
            let name = format!("{id} [{domain}]");
            let result = match result {
                Ok((status, message)) => ComponentResult::new(&name, status, Some(message)),
                Err(e) => ComponentResult::failed(
                    &name,
                    ComponentError::CommandFailed {
                        stage: "defaults".to_string(),
                        command: prefs.description(),
                        code: -1,
                        output: format!("{e:#}"),
                    },
                ),
            };
            log.record(result.entry());
            report.results.push(result);
        }
    }
    report
}

fn sync_domain(
    prefs: &PreferencesResource<'_>,
    action: DefaultsAction,
    dry_run: bool,
    log: &dyn Log,
) -> Result<(ComponentStatus, String)> {
    let domain = &prefs.domain;
    match action {
        DefaultsAction::Diff => Ok(match prefs.current_state()? {
            ResourceState::Correct => (ComponentStatus::Skipped, "in sync".to_string()),
            ResourceState::Invalid { reason } => (ComponentStatus::Skipped, reason),
            ResourceState::Missing | ResourceState::Incorrect { .. } => {
                log.warn(&format!("{domain} differs from {}", prefs.file.display()));
                (ComponentStatus::Success, "differs".to_string())
            }
        }),
        DefaultsAction::Export if dry_run => {
            log.dry_run(&format!("would export {domain} to {}", prefs.file.display()));
            Ok((ComponentStatus::DryRun, "export".to_string()))
        }
        DefaultsAction::Export => {
            prefs.export()?;
            Ok((ComponentStatus::Success, "exported".to_string()))
        }
        DefaultsAction::Import => {
            if !prefs.needs_change()? {
                return Ok((ComponentStatus::Skipped, "in sync".to_string()));
            }
            if dry_run {
                log.dry_run(&format!("would import {} into {domain}", prefs.file.display()));
                return Ok((ComponentStatus::DryRun, "import".to_string()));
            }
            prefs.apply()?;
            Ok((ComponentStatus::Success, "imported".to_string()))
        }
    }
}

/// Run the defaults command.
///
/// # Errors
///
/// Returns an error if configuration loading or profile resolution fails, or
/// if any domain failed to sync.
pub fn run(global: &GlobalOpts, opts: &DefaultsOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, &**log)?;
    let state = setup.load_state()?;
    let selection = setup.select(global, &opts.args, &state, &**log);
    let resolved = setup.resolve(&selection, &**log)?;

    log.stage("Syncing preferences");
    let report = sync(
        &resolved.selected.components,
        opts.action,
        &setup.config.root,
        &setup.platform,
        &SystemExecutor,
        global.dry_run,
        &**log,
    );
    super::finish(&report, log)
}
