//! Hooks command: re-run lifecycle hooks without reinstalling.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, SelectOpts};
use crate::engine::RunOptions;
use crate::logging::Logger;

/// Run the hooks command.
///
/// # Errors
///
/// Returns an error if configuration loading, profile resolution, or a lock
/// file write fails, or if any hook failed.
pub fn run(global: &GlobalOpts, opts: &SelectOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, &**log)?;
    let state = setup.load_state()?;
    let selection = setup.select(global, &opts.args, &state, &**log);
    let resolved = setup.resolve(&selection, &**log)?;

    let options = RunOptions {
        dry_run: global.dry_run,
        ..RunOptions::default()
    };
    let mut engine = setup.engine(log, state, options)?;
    let report = engine.run_hooks(&resolved.selected.components)?;
    super::finish(&report, log)
}
