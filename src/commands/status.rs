//! Status command: what is configured, what is recorded, and where they differ.
use anyhow::Result;
use std::sync::Arc;

use super::Resolved;
use crate::cli::{GlobalOpts, SelectOpts};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Logger;
use crate::state::StateStore;

/// One line per selected component, then one per tracked component that is
/// no longer configured.
#[must_use]
pub fn status_lines(resolved: &Resolved, state: &StateStore, executor: &dyn Executor) -> Vec<String> {
    let mut lines = Vec::new();
    for component in &resolved.selected.components {
        let id = component.identity();
        let Some(entry) = state.get(&id) else {
            lines.push(format!("○ {id}: not installed"));
            continue;
        };

        let mut details = Vec::new();
        if entry.package_manager_used.is_empty() {
            details.push("links only".to_string());
        } else {
            details.push(format!("via {}", entry.package_manager_used));
        }
        if !entry.links.is_empty() {
            details.push(format!("{} link(s)", entry.links.len()));
        }
        if entry.post_install_ran {
            details.push("postInstall ran".to_string());
        }
        if entry.post_link_ran {
            details.push("postLink ran".to_string());
        }

        let changed = state.has_install_changed(&id, &component.component.install, executor)
            || entry.links != component.component.link;
        let icon = if changed { "~" } else { "✓" };
        let suffix = if changed { ", out of date" } else { "" };
        lines.push(format!("{icon} {id}: {}{suffix}", details.join(", ")));
    }

    for orphan in state.removed_components(&resolved.full.identities()) {
        lines.push(format!("✗ {}: no longer configured", orphan.identity()));
    }
    lines
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if configuration loading, profile resolution, or the
/// lock file read fails.
pub fn run(global: &GlobalOpts, opts: &SelectOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, &**log)?;
    let state = setup.load_state()?;
    let selection = setup.select(global, &opts.args, &state, &**log);
    let resolved = setup.resolve(&selection, &**log)?;

    log.stage("Status");
    let active = state.active_profiles();
    log.info(&format!(
        "active profiles: {}",
        if active.is_empty() {
            "(none)".to_string()
        } else {
            active.join(", ")
        }
    ));
    log.info(&format!("lock file: {}", state.path().display()));
    for line in status_lines(&resolved, &state, &SystemExecutor) {
        log.info(&line);
    }
    Ok(())
}
