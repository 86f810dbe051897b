//! Persisted record of applied components and its change-detection queries.
//!
//! The [`StateStore`] owns the in-memory [`LockFile`] for a run.  Every
//! mutation marks the store dirty; [`StateStore::save`] only touches disk
//! when something changed, so a run that converges to the same state leaves
//! the lock file untouched.
pub mod lock;

use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::exec::Executor;
use crate::platform::first_available;
pub use lock::{ComponentState, LOCK_FILE_VERSION, LockFile};

/// Lock file name inside the state directory.
pub const LOCK_FILE_NAME: &str = "lock.json";

/// Split an identity into `(profile, component)` at the first `.`.
///
/// Profile names never contain `.` (rejected at config load), so the split
/// is unambiguous.
#[must_use]
pub fn split_identity(id: &str) -> (&str, &str) {
    id.split_once('.').unwrap_or((id, ""))
}

/// Loaded lock file plus the path it is saved back to.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    lock: LockFile,
    dirty: bool,
}

impl StateStore {
    /// Load the lock file at `path`.
    ///
    /// A missing file yields an empty store that will be created on the
    /// first [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Read`] if the file exists but cannot be read and
    /// [`StateError::Parse`] if it is not a valid lock file.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    path: path.to_path_buf(),
                    lock: LockFile::default(),
                    dirty: true,
                });
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut lock: LockFile =
            serde_json::from_str(&content).map_err(|source| StateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let dirty = lock.migrate();
        Ok(Self {
            path: path.to_path_buf(),
            lock,
            dirty,
        })
    }

    /// An empty store for `path` that is never read from disk.
    #[must_use]
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lock: LockFile::default(),
            dirty: true,
        }
    }

    /// Write the lock file if anything changed since load (or the last save).
    ///
    /// Writes go to a sibling temporary file that is renamed over the lock
    /// file.  Returns `true` if the file was written.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the directory, temporary file, or
    /// rename fails.
    pub fn save(&mut self) -> Result<bool, StateError> {
        if !self.dirty {
            return Ok(false);
        }
        let path = self.path.clone();
        let write_err = move |source: std::io::Error| StateError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(&write_err)?;
        }

        self.lock.last_updated = Utc::now();
        let json = serde_json::to_string_pretty(&self.lock)
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp = self.temp_path();
        fs::write(&tmp, format!("{json}\n")).map_err(&write_err)?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            fs::remove_file(&tmp).ok();
            return Err(write_err(source));
        }

        self.dirty = false;
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Path the store is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read-only view of the whole lock file.
    #[must_use]
    pub const fn lock(&self) -> &LockFile {
        &self.lock
    }

    /// Profiles recorded by the last explicit-profile run.
    #[must_use]
    pub fn active_profiles(&self) -> &[String] {
        &self.lock.active_profiles
    }

    /// Replace the recorded active profiles.
    pub fn set_active_profiles(&mut self, profiles: Vec<String>) {
        if self.lock.active_profiles != profiles {
            self.lock.active_profiles = profiles;
            self.dirty = true;
        }
    }

    /// Whether `id` has a state entry.
    #[must_use]
    pub fn is_installed(&self, id: &str) -> bool {
        self.lock.installed_components.contains_key(id)
    }

    /// State entry for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ComponentState> {
        self.lock.installed_components.get(id)
    }

    /// Every state entry, in identity order.
    pub fn entries(&self) -> impl Iterator<Item = &ComponentState> {
        self.lock.installed_components.values()
    }

    /// Whether the install for `id` must be (re)run because the install
    /// table no longer agrees with what was recorded.
    ///
    /// True when `id` is not installed, when exactly one of the recorded
    /// manager and `install` is empty, or when the manager and command that
    /// would be chosen now differ from the recorded pair.
    pub fn has_install_changed(
        &self,
        id: &str,
        install: &BTreeMap<String, String>,
        executor: &dyn Executor,
    ) -> bool {
        let Some(state) = self.get(id) else {
            return true;
        };
        match (state.package_manager_used.is_empty(), install.is_empty()) {
            (true, true) => false,
            (true, false) | (false, true) => true,
            (false, false) => first_available(install, executor).is_none_or(|sel| {
                sel.manager != state.package_manager_used
                    || sel.command != state.install_command_used
            }),
        }
    }

    /// Record a successful install (or, with empty `manager` and `command`,
    /// a link-only application) of `id`.
    ///
    /// Hook flags of an existing entry are preserved.
    pub fn mark_installed(
        &mut self,
        id: &str,
        manager: &str,
        command: &str,
        links: &BTreeMap<String, String>,
    ) {
        let (profile, component) = split_identity(id);
        let previous = self.lock.installed_components.get(id);
        let state = ComponentState {
            profile_name: profile.to_string(),
            component_name: component.to_string(),
            installed_at: Utc::now(),
            package_manager_used: manager.to_string(),
            install_command_used: command.to_string(),
            links: links.clone(),
            post_install_ran: previous.is_some_and(|p| p.post_install_ran),
            post_link_ran: previous.is_some_and(|p| p.post_link_ran),
        };
        self.lock.installed_components.insert(id.to_string(), state);
        self.dirty = true;
    }

    /// Replace the recorded links of an installed `id`.
    pub fn record_links(&mut self, id: &str, links: &BTreeMap<String, String>) {
        if let Some(state) = self.lock.installed_components.get_mut(id)
            && state.links != *links
        {
            state.links.clone_from(links);
            self.dirty = true;
        }
    }

    /// Note that the postInstall hook of `id` has run.
    pub fn mark_post_install_ran(&mut self, id: &str) {
        if let Some(state) = self.lock.installed_components.get_mut(id)
            && !state.post_install_ran
        {
            state.post_install_ran = true;
            self.dirty = true;
        }
    }

    /// Note that the postLink hook of `id` has run.
    pub fn mark_post_link_ran(&mut self, id: &str) {
        if let Some(state) = self.lock.installed_components.get_mut(id)
            && !state.post_link_ran
        {
            state.post_link_ran = true;
            self.dirty = true;
        }
    }

    /// Drop the state entry for `id`, returning it.
    pub fn remove(&mut self, id: &str) -> Option<ComponentState> {
        let removed = self.lock.installed_components.remove(id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// State entries whose identity is not in `current`, sorted by identity.
    #[must_use]
    pub fn removed_components(&self, current: &[String]) -> Vec<ComponentState> {
        self.lock
            .installed_components
            .iter()
            .filter(|(id, _)| !current.contains(id))
            .map(|(_, state)| state.clone())
            .collect()
    }
}
