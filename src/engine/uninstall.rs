use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{ComponentResult, Engine, tried};
use crate::error::ComponentError;
use crate::logging::ComponentStatus;
use crate::platform::preferred_or_first_available;
use crate::state::ComponentState;

impl Engine {
    /// Undo a tracked component: run its uninstall command, remove the links
    /// it recorded, and drop its state entry.
    ///
    /// The definition is looked up in the config ignoring OS filters and
    /// profile activation.  Links whose destination is in `claimed` belong
    /// to another component and are left in place.  A failed uninstall keeps
    /// the state entry so the next run retries.
    pub(super) fn uninstall(
        &mut self,
        entry: &ComponentState,
        claimed: &BTreeSet<PathBuf>,
    ) -> ComponentResult {
        let id = entry.identity();
        self.ctx.log.progress(&id);
        match self.uninstall_component(&id, entry, claimed) {
            Ok(result) => result,
            Err(e) => ComponentResult::failed(&id, e),
        }
    }

    fn uninstall_component(
        &mut self,
        id: &str,
        entry: &ComponentState,
        claimed: &BTreeSet<PathBuf>,
    ) -> Result<ComponentResult, ComponentError> {
        let dry_run = self.ctx.dry_run();
        let mut notes = Vec::new();

        let uninstall = self
            .ctx
            .config
            .find_component(&entry.profile_name, &entry.component_name)
            .map(|c| c.uninstall.clone())
            .filter(|table| !table.is_empty());

        match uninstall {
            None => {
                if !entry.package_manager_used.is_empty() {
                    self.ctx.log.warn(&format!(
                        "{id}: no uninstall command; {} package left in place",
                        entry.package_manager_used
                    ));
                }
            }
            Some(table) => {
                let selection = preferred_or_first_available(
                    &table,
                    &entry.package_manager_used,
                    &*self.ctx.executor,
                )
                .ok_or_else(|| ComponentError::NoAvailableCommand {
                    tried: tried(&table),
                })?;
                if dry_run {
                    self.ctx.log.dry_run(&format!(
                        "{id}: would uninstall via {}: {}",
                        selection.manager, selection.command
                    ));
                } else {
                    self.run_command("uninstall", &selection.command)?;
                }
                notes.push(format!("uninstalled via {}", selection.manager));
            }
        }

        let linker = self.ctx.linker();
        let mut removed = 0usize;
        for (source, dest) in &entry.links {
            if claimed.contains(&linker.dest_path(dest)) {
                self.ctx
                    .log
                    .debug(&format!("{id}: {dest} is still configured, left in place"));
                continue;
            }
            if dry_run {
                self.ctx.log.dry_run(&format!("{id}: would remove link {dest}"));
                removed += 1;
                continue;
            }
            let gone = linker
                .remove(source, dest)
                .map_err(|e| ComponentError::LinkFailed {
                    dest: dest.clone(),
                    reason: format!("{e:#}"),
                })?;
            if gone {
                removed += 1;
            } else {
                self.ctx
                    .log
                    .debug(&format!("{id}: {dest} is not our link, left in place"));
            }
        }
        if removed > 0 {
            notes.push(format!(
                "{removed} link{} removed",
                if removed == 1 { "" } else { "s" }
            ));
        }

        let status = if dry_run {
            ComponentStatus::DryRun
        } else {
            self.state.remove(id);
            ComponentStatus::Success
        };
        notes.insert(0, "removed".to_string());
        Ok(ComponentResult::new(id, status, Some(notes.join(", "))))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::RunOptions;
    use super::super::test_helpers::{Fixture, ScriptedExecutor};
    use crate::logging::ComponentStatus;
    use std::fs;

    const CONFIG: &str = r#"
[profiles."*".bash]
link = { "bash/.bashrc" = "~/.bashrc" }

[profiles.dev.ripgrep]
install = { apt = "apt-get install -y ripgrep", brew = "brew install ripgrep" }
uninstall = { apt = "apt-get remove -y ripgrep", brew = "brew uninstall ripgrep" }
link = { "rg/ripgreprc" = "~/.ripgreprc" }
"#;

    fn fixture(executor: ScriptedExecutor) -> Fixture {
        Fixture::new(CONFIG, &["bash/.bashrc", "rg/ripgreprc"], executor)
    }

    #[test]
    fn dropping_a_profile_uninstalls_its_components() {
        let f = fixture(ScriptedExecutor::with_programs(&["apt"]));
        f.run(&["dev"], RunOptions::default());
        assert!(f.home().join(".ripgreprc").symlink_metadata().is_ok());

        let (report, state) = f.run(&[], RunOptions::default());
        let result = report.get("dev.ripgrep").unwrap();
        assert_eq!(result.status, ComponentStatus::Success);
        let uninstalls: Vec<String> = f
            .executor
            .calls()
            .into_iter()
            .filter(|c| c.contains("remove"))
            .collect();
        assert_eq!(uninstalls, ["apt-get remove -y ripgrep"]);
        assert!(f.home().join(".ripgreprc").symlink_metadata().is_err());
        assert!(!state.is_installed("dev.ripgrep"));
        assert!(state.is_installed("*.bash"));
    }

    #[test]
    fn uninstall_prefers_recorded_manager() {
        let f = fixture(ScriptedExecutor::with_programs(&["brew"]));
        let (_, state) = f.run(&["dev"], RunOptions::default());
        assert_eq!(
            state.get("dev.ripgrep").unwrap().package_manager_used,
            "brew"
        );

        // apt sorts first on this host, but brew did the install
        let g = fixture(ScriptedExecutor::with_programs(&["apt", "brew"]));
        fs::create_dir_all(g.state_path().parent().unwrap()).unwrap();
        fs::copy(f.state_path(), g.state_path()).unwrap();
        let (_, state) = g.run(&[], RunOptions::default());
        assert!(!state.is_installed("dev.ripgrep"));
        assert!(g.executor.calls().contains(&"brew uninstall ripgrep".to_string()));
        assert!(!g.executor.calls().iter().any(|c| c.starts_with("apt-get remove")));
    }

    #[test]
    fn failed_uninstall_keeps_state_for_retry() {
        let mut executor = ScriptedExecutor::with_programs(&["apt"]);
        executor.failing.push("remove".to_string());
        let f = fixture(executor);
        f.run(&["dev"], RunOptions::default());
        let (report, state) = f.run(&[], RunOptions::default());
        assert_eq!(
            report.get("dev.ripgrep").unwrap().status,
            ComponentStatus::Failed
        );
        assert!(state.is_installed("dev.ripgrep"));
        assert!(f.home().join(".ripgreprc").symlink_metadata().is_ok());
    }

    #[test]
    fn component_gone_from_config_still_loses_links_and_state() {
        let f = fixture(ScriptedExecutor::with_programs(&["apt"]));
        f.run(&["dev"], RunOptions::default());

        let g = Fixture::new(
            "[profiles.\"*\".bash]\nlink = { \"bash/.bashrc\" = \"~/.bashrc\" }\n",
            &["bash/.bashrc"],
            ScriptedExecutor::with_programs(&["apt"]),
        );
        fs::create_dir_all(g.state_path().parent().unwrap()).unwrap();
        fs::copy(f.state_path(), g.state_path()).unwrap();
        let (report, state) = g.run(&[], RunOptions::default());
        assert_eq!(
            report.get("dev.ripgrep").unwrap().status,
            ComponentStatus::Success
        );
        assert!(!state.is_installed("dev.ripgrep"));
        assert!(g.log.contains("no uninstall command"));
    }

    #[test]
    fn replaced_link_is_left_alone() {
        let f = fixture(ScriptedExecutor::with_programs(&["apt"]));
        f.run(&["dev"], RunOptions::default());
        let dest = f.home().join(".ripgreprc");
        fs::remove_file(&dest).unwrap();
        fs::write(&dest, "mine now").unwrap();

        let (_, state) = f.run(&[], RunOptions::default());
        assert!(!state.is_installed("dev.ripgrep"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "mine now");
    }

    #[test]
    fn dry_run_uninstall_changes_nothing() {
        let f = fixture(ScriptedExecutor::with_programs(&["apt"]));
        f.run(&["dev"], RunOptions::default());
        let calls_before = f.executor.calls().len();
        let (report, _) = f.run(
            &[],
            RunOptions {
                dry_run: true,
                ..RunOptions::default()
            },
        );
        assert_eq!(
            report.get("dev.ripgrep").unwrap().status,
            ComponentStatus::DryRun
        );
        assert_eq!(f.executor.calls().len(), calls_before);
        assert!(f.home().join(".ripgreprc").symlink_metadata().is_ok());
    }
}
