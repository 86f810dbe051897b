//! Install command: converge the selected profiles and uninstall what left
//! the configuration.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::engine::RunOptions;
use crate::logging::Logger;

/// Run options for an install invocation.
#[must_use]
pub const fn run_options(global: &GlobalOpts, opts: &InstallOpts) -> RunOptions {
    RunOptions {
        dry_run: global.dry_run,
        force_install: opts.force,
        backup_conflicts: opts.force || opts.backup,
    }
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if configuration loading, profile resolution, or a lock
/// file write fails, or if any component failed.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Arc<Logger>) -> Result<()> {
    let version = option_env!("DOTSTATE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("dotstate {version}"));

    let setup = super::CommandSetup::init(global, &**log)?;
    let mut state = setup.load_state()?;

    log.stage("Resolving components");
    let selection = setup.select(global, &opts.args, &state, &**log);
    let resolved = setup.resolve(&selection, &**log)?;
    if selection.explicit {
        state.set_active_profiles(selection.profiles.clone());
    }
    log.info(&format!(
        "{} component(s) selected on {}",
        resolved.selected.components.len(),
        setup.platform.os
    ));

    let mut engine = setup.engine(log, state, run_options(global, opts))?;
    let report = engine.run(&resolved.selected.components, &resolved.full.identities())?;
    super::finish(&report, log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_implies_backup() {
        let opts = InstallOpts {
            force: true,
            ..InstallOpts::default()
        };
        let options = run_options(&GlobalOpts::default(), &opts);
        assert!(options.force_install);
        assert!(options.backup_conflicts);
    }

    #[test]
    fn backup_alone_does_not_force() {
        let opts = InstallOpts {
            backup: true,
            ..InstallOpts::default()
        };
        let global = GlobalOpts {
            dry_run: true,
            ..GlobalOpts::default()
        };
        let options = run_options(&global, &opts);
        assert!(!options.force_install);
        assert!(options.backup_conflicts);
        assert!(options.dry_run);
    }
}
