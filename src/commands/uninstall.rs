//! Uninstall command implementation.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, UninstallOpts};
use crate::config::matcher::{best_match, match_kind};
use crate::engine::RunOptions;
use crate::logging::Logger;
use crate::state::{ComponentState, StateStore};

/// Tracked identities to uninstall: all of them, or those matching `terms`.
#[must_use]
pub fn targets(state: &StateStore, terms: &[String]) -> Vec<String> {
    state
        .entries()
        .map(ComponentState::identity)
        .filter(|id| terms.is_empty() || best_match(id, terms).is_some())
        .collect()
}

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if configuration loading or a lock file write fails, or
/// if any component failed to uninstall.
pub fn run(global: &GlobalOpts, opts: &UninstallOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, &**log)?;
    let state = setup.load_state()?;

    let ids = targets(&state, &opts.terms);
    if ids.is_empty() {
        log.info("nothing to uninstall");
    }
    for term in &opts.terms {
        if !ids.iter().any(|id| match_kind(id, term).is_some()) {
            log.warn(&format!("no tracked component matches '{term}'"));
        }
    }

    let options = RunOptions {
        dry_run: global.dry_run,
        ..RunOptions::default()
    };
    let mut engine = setup.engine(log, state, options)?;
    let report = engine.uninstall_tracked(&ids)?;
    super::finish(&report, log)
}
