use super::{ComponentResult, Engine};
use crate::config::profiles::ResolvedComponent;
use crate::error::ComponentError;
use crate::logging::ComponentStatus;

impl Engine {
    /// Run the hooks of one component out of band.
    ///
    /// `postInstall` only runs for components that are tracked as installed;
    /// `postLink` runs whenever it is set.
    pub(super) fn hooks(&mut self, resolved: &ResolvedComponent) -> ComponentResult {
        let id = resolved.identity();
        self.ctx.log.progress(&id);
        match self.run_component_hooks(&id, resolved) {
            Ok(result) => result,
            Err(e) => ComponentResult::failed(&id, e),
        }
    }

    fn run_component_hooks(
        &mut self,
        id: &str,
        resolved: &ResolvedComponent,
    ) -> Result<ComponentResult, ComponentError> {
        let component = &resolved.component;
        let dry_run = self.ctx.dry_run();
        let mut ran = Vec::new();

        if let Some(hook) = &component.post_install {
            if self.state.is_installed(id) {
                if dry_run {
                    self.ctx.log.dry_run(&format!("{id}: would run postInstall: {hook}"));
                } else {
                    self.run_command("postInstall", hook)?;
                    self.state.mark_post_install_ran(id);
                }
                ran.push("postInstall");
            } else {
                self.ctx
                    .log
                    .debug(&format!("{id}: not installed, postInstall skipped"));
            }
        }

        if let Some(hook) = &component.post_link {
            if dry_run {
                self.ctx.log.dry_run(&format!("{id}: would run postLink: {hook}"));
            } else {
                self.run_command("postLink", hook)?;
                self.state.mark_post_link_ran(id);
            }
            ran.push("postLink");
        }

        Ok(if ran.is_empty() {
            ComponentResult::new(id, ComponentStatus::Skipped, Some("no hooks".to_string()))
        } else if dry_run {
            ComponentResult::new(id, ComponentStatus::DryRun, Some(ran.join(", ")))
        } else {
            ComponentResult::new(id, ComponentStatus::Success, Some(format!("{} ran", ran.join(", "))))
        })
    }
}
