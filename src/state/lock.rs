//! On-disk lock file schema.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current lock file schema version.
pub const LOCK_FILE_VERSION: u32 = 1;

/// Persisted record of what has been applied to this machine.
///
/// ```json
/// {
///   "version": 1,
///   "lastUpdated": "2026-01-01T00:00:00Z",
///   "activeProfiles": ["dev"],
///   "installedComponents": { "dev.tools.ripgrep": { ... } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    /// Schema version.
    pub version: u32,
    /// Time of the last save.
    pub last_updated: DateTime<Utc>,
    /// Profiles requested by the last run that named them explicitly.
    #[serde(default)]
    pub active_profiles: Vec<String>,
    /// Applied components keyed by identity (`<profile>.<component>`).
    #[serde(default)]
    pub installed_components: BTreeMap<String, ComponentState>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: LOCK_FILE_VERSION,
            last_updated: Utc::now(),
            active_profiles: Vec::new(),
            installed_components: BTreeMap::new(),
        }
    }
}

impl LockFile {
    /// Bring an older (or newer) schema up to [`LOCK_FILE_VERSION`].
    ///
    /// Version 1 is the first schema, so migration only rewrites the stamp.
    /// Returns `true` if anything changed.
    pub fn migrate(&mut self) -> bool {
        if self.version == LOCK_FILE_VERSION {
            return false;
        }
        self.version = LOCK_FILE_VERSION;
        true
    }
}

/// What the engine applied for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    /// Profile the component was resolved from.
    pub profile_name: String,
    /// Dotted component path within the profile.
    pub component_name: String,
    /// Time of the last install or link-only application.
    pub installed_at: DateTime<Utc>,
    /// Empty for link-only components.
    #[serde(default)]
    pub package_manager_used: String,
    /// Empty for link-only components.
    #[serde(default)]
    pub install_command_used: String,
    /// Source → destination, as configured.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Whether postInstall has completed since the last install.
    #[serde(default)]
    pub post_install_ran: bool,
    /// Whether postLink has completed at least once.
    #[serde(default)]
    pub post_link_ran: bool,
}

impl ComponentState {
    /// Persistent identity: `<profile>.<component>`.
    #[must_use]
    pub fn identity(&self) -> String {
        format!("{}.{}", self.profile_name, self.component_name)
    }
}
