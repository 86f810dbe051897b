//! macOS preference domains synced through the `defaults` tool.
use anyhow::{Context as _, Result, bail};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::{Executor, quote};

/// Name of the preferences executable.
pub const DEFAULTS_PROGRAM: &str = "defaults";

/// One preference domain backed by a plist file in the repository.
#[derive(Debug)]
pub struct PreferencesResource<'a> {
    /// Preference domain, e.g. `com.apple.dock`.
    pub domain: String,
    /// Absolute path of the exported plist.
    pub file: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> PreferencesResource<'a> {
    /// Create a preferences resource.
    #[must_use]
    pub const fn new(domain: String, file: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            domain,
            file,
            executor,
        }
    }

    fn run(&self, command: &str) -> Result<String> {
        let result = self.executor.run(command)?;
        if !result.success {
            bail!("{command} failed: {}", result.combined_output());
        }
        Ok(result.stdout)
    }

    /// Write the live preferences of the domain to the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or
    /// `defaults export` fails.
    pub fn export(&self) -> Result<ResourceChange> {
        super::helpers::fs::ensure_parent_dir(&self.file)?;
        self.run(&format!(
            "{DEFAULTS_PROGRAM} export {} {}",
            quote(&self.domain),
            quote(&self.file.to_string_lossy())
        ))?;
        Ok(ResourceChange::Applied)
    }
}

impl Applicable for PreferencesResource<'_> {
    fn description(&self) -> String {
        format!("{} <- {}", self.domain, self.file.display())
    }

    /// Import the file into the domain.
    fn apply(&self) -> Result<ResourceChange> {
        self.run(&format!(
            "{DEFAULTS_PROGRAM} import {} {}",
            quote(&self.domain),
            quote(&self.file.to_string_lossy())
        ))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PreferencesResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.file.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("preferences file missing: {}", self.file.display()),
            });
        }
        let wanted = std::fs::read_to_string(&self.file)
            .with_context(|| format!("reading {}", self.file.display()))?;
        let live = self.run(&format!(
            "{DEFAULTS_PROGRAM} export {} -",
            quote(&self.domain)
        ))?;
        if live.trim() == wanted.trim() {
            Ok(ResourceState::Correct)
        } else if live.trim().is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Incorrect {
                current: "live preferences differ".to_string(),
            })
        }
    }
}
