//! Idempotent primitives the engine converges with.
//!
//! Three kinds exist: [`symlink`] (dotfile links under the home directory),
//! [`command`] (install, uninstall and hook commands) and [`defaults`]
//! (macOS preference domains).  Commands cannot report their own state, so
//! they implement only [`Applicable`]; links and preference domains also
//! implement [`Resource`].
pub mod command;
pub mod defaults;
pub mod helpers;
pub mod symlink;

use anyhow::Result;

/// Something the engine can describe and apply.
pub trait Applicable {
    /// Short description used in logs and failure reports, e.g.
    /// `~/.zshrc -> zsh/.zshrc`.
    fn description(&self) -> String;

    /// Make the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem operation or command fails.
    fn apply(&self) -> Result<ResourceChange>;

    /// Undo a previous [`apply`](Self::apply).
    ///
    /// Only links support removal; everything else is undone by running the
    /// component's uninstall command instead.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails or is not supported.
    fn remove(&self) -> Result<ResourceChange> {
        anyhow::bail!("cannot remove '{}'", self.description())
    }
}

/// Observed state of a link or preference domain.
///
/// # Examples
///
/// ```
/// use dotstate::resources::ResourceState;
///
/// let foreign = ResourceState::Incorrect { current: "/etc/zshrc".into() };
/// let no_source = ResourceState::Invalid { reason: "zsh/.zshrc does not exist".into() };
///
/// assert_ne!(foreign, ResourceState::Correct);
/// assert_ne!(no_source, ResourceState::Missing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing at the destination (or an empty preference domain).
    Missing,
    /// Already in the declared state.
    Correct,
    /// Present but different.
    Incorrect {
        /// What is there instead (link target, file kind, exported value).
        current: String,
    },
    /// Cannot be converged, typically because the repository file is gone.
    Invalid {
        /// Why.
        reason: String,
    },
}

/// What [`Applicable::apply`] or [`Applicable::remove`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Created, replaced, imported, or removed.
    Applied,
    /// Nothing to do.
    AlreadyCorrect,
    /// Deliberately left untouched, e.g. a destination that is not our link.
    Skipped {
        /// Why it was left alone.
        reason: String,
    },
}

/// An [`Applicable`] that can also inspect itself.
pub trait Resource: Applicable {
    /// Inspect the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read (I/O error, failing
    /// `defaults export`).
    fn current_state(&self) -> Result<ResourceState>;

    /// Whether [`apply`](Applicable::apply) would change anything.
    ///
    /// [`ResourceState::Invalid`] counts as "no": there is nothing valid to
    /// apply.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}
