use std::collections::BTreeMap;

use super::{ComponentResult, Engine, tried};
use crate::config::model::Component;
use crate::config::profiles::ResolvedComponent;
use crate::error::ComponentError;
use crate::logging::ComponentStatus;
use crate::platform::first_available;
use crate::resources::defaults::{DEFAULTS_PROGRAM, PreferencesResource};
use crate::resources::symlink::LinkOutcome;
use crate::resources::{Resource as _, ResourceState};

/// Side effects performed (or, in a dry run, planned) for one component.
#[derive(Debug, Default)]
struct Actions {
    installed: bool,
    links_changed: bool,
    notes: Vec<String>,
}

impl Actions {
    fn any(&self) -> bool {
        self.installed || self.links_changed || !self.notes.is_empty()
    }

    fn message(&self) -> Option<String> {
        (!self.notes.is_empty()).then(|| self.notes.join(", "))
    }
}

impl Engine {
    /// Bring one component to its declared state.
    pub(super) fn converge(&mut self, resolved: &ResolvedComponent) -> ComponentResult {
        let id = resolved.identity();
        self.ctx.log.progress(&id);
        match self.converge_component(&id, &resolved.component) {
            Ok(result) => result,
            Err(e) => ComponentResult::failed(&id, e),
        }
    }

    fn converge_component(
        &mut self,
        id: &str,
        component: &Component,
    ) -> Result<ComponentResult, ComponentError> {
        let dry_run = self.ctx.dry_run();
        let needs_install = self.ctx.options.force_install
            || !self.state.is_installed(id)
            || self
                .state
                .has_install_changed(id, &component.install, &*self.ctx.executor);

        if !needs_install && component.link.is_empty() {
            return Ok(ComponentResult::new(
                id,
                ComponentStatus::Skipped,
                Some("up to date".to_string()),
            ));
        }

        let mut actions = Actions::default();

        if needs_install && !component.install.is_empty() {
            let selection = first_available(&component.install, &*self.ctx.executor).ok_or_else(
                || ComponentError::NoAvailableCommand {
                    tried: tried(&component.install),
                },
            )?;
            if dry_run {
                self.ctx.log.dry_run(&format!(
                    "{id}: would install via {}: {}",
                    selection.manager, selection.command
                ));
            } else {
                self.run_command("install", &selection.command)?;
                self.state.mark_installed(
                    id,
                    &selection.manager,
                    &selection.command,
                    &component.link,
                );
            }
            actions.installed = true;
            actions.notes.push(format!("installed via {}", selection.manager));
        }

        self.converge_links(id, &component.link, &mut actions)?;

        if !dry_run {
            let links_differ = self
                .state
                .get(id)
                .is_none_or(|state| state.links != component.link);
            if component.install.is_empty()
                && (needs_install || actions.links_changed || links_differ)
            {
                self.state.mark_installed(id, "", "", &component.link);
            } else if links_differ {
                self.state.record_links(id, &component.link);
            }
        }

        self.check_defaults(id, &component.defaults);

        if let Some(hook) = &component.post_install
            && actions.installed
        {
            if dry_run {
                self.ctx.log.dry_run(&format!("{id}: would run postInstall: {hook}"));
            } else {
                self.run_command("postInstall", hook)?;
                self.state.mark_post_install_ran(id);
            }
            actions.notes.push("postInstall ran".to_string());
        }

        if let Some(hook) = &component.post_link
            && actions.links_changed
        {
            if dry_run {
                self.ctx.log.dry_run(&format!("{id}: would run postLink: {hook}"));
            } else {
                self.run_command("postLink", hook)?;
                self.state.mark_post_link_ran(id);
            }
            actions.notes.push("postLink ran".to_string());
        }

        let status = if !needs_install && !actions.any() {
            ComponentStatus::Skipped
        } else if dry_run {
            ComponentStatus::DryRun
        } else {
            ComponentStatus::Success
        };
        let message = match status {
            ComponentStatus::Skipped => Some("up to date".to_string()),
            _ => actions.message(),
        };
        Ok(ComponentResult::new(id, status, message))
    }

    /// Ensure (or, in a dry run, plan) every link of the component.
    fn converge_links(
        &self,
        id: &str,
        links: &BTreeMap<String, String>,
        actions: &mut Actions,
    ) -> Result<(), ComponentError> {
        let linker = self.ctx.linker();
        let mut created = 0usize;
        for (source, dest) in links {
            let outcome = if self.ctx.dry_run() {
                linker.plan(source, dest)
            } else {
                linker.ensure(source, dest)
            }
            .map_err(|e| ComponentError::LinkFailed {
                dest: dest.clone(),
                reason: format!("{e:#}"),
            })?;

            match &outcome {
                LinkOutcome::AlreadyCorrect => {
                    self.ctx.log.debug(&format!("{id}: {dest} already linked"));
                }
                LinkOutcome::Created if self.ctx.dry_run() => {
                    self.ctx.log.dry_run(&format!("{id}: would link {dest} -> {source}"));
                }
                LinkOutcome::Created => {
                    self.ctx.log.debug(&format!("{id}: linked {dest} -> {source}"));
                }
                LinkOutcome::ReplacedAfterBackup(backup) if self.ctx.dry_run() => {
                    self.ctx.log.dry_run(&format!(
                        "{id}: would move {dest} to {} and link it",
                        backup.display()
                    ));
                }
                LinkOutcome::ReplacedAfterBackup(backup) => {
                    self.ctx
                        .log
                        .warn(&format!("{id}: moved {dest} to {}", backup.display()));
                }
            }
            if outcome.changed() {
                created += 1;
            }
        }
        if created > 0 {
            actions.links_changed = true;
            actions.notes.push(format!(
                "{created} link{}",
                if created == 1 { "" } else { "s" }
            ));
        }
        Ok(())
    }

    /// Compare preference domains with their exported files.  Advisory only.
    fn check_defaults(&self, id: &str, defaults: &BTreeMap<String, String>) {
        if defaults.is_empty()
            || !self.ctx.platform.is_darwin()
            || !self.ctx.executor.which(DEFAULTS_PROGRAM)
        {
            return;
        }
        for (domain, file) in defaults {
            let prefs = PreferencesResource::new(
                domain.clone(),
                self.ctx.config.root.join(file),
                &*self.ctx.executor,
            );
            match prefs.current_state() {
                Ok(ResourceState::Correct) => {
                    self.ctx.log.debug(&format!("{id}: {domain} matches {file}"));
                }
                Ok(ResourceState::Invalid { reason }) => {
                    self.ctx.log.warn(&format!("{id}: {domain}: {reason}"));
                }
                Ok(ResourceState::Missing | ResourceState::Incorrect { .. }) => {
                    self.ctx.log.warn(&format!(
                        "{id}: preferences for {domain} differ from {file} (run `dotstate defaults import`)"
                    ));
                }
                Err(e) => {
                    self.ctx
                        .log
                        .warn(&format!("{id}: could not read {domain}: {e:#}"));
                }
            }
        }
    }
}
