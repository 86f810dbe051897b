//! The declarative model: `dotstate.toml` loading, validation and profile
//! resolution.
pub mod matcher;
pub mod model;
pub mod profiles;
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use model::{Component, Profile};

/// Default configuration file name, looked up at the repository root.
pub const CONFIG_FILE_NAME: &str = "dotstate.toml";

/// The always-active profile.
pub const BASE_PROFILE: &str = "*";

/// Top-level layout of `dotstate.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    profiles: BTreeMap<String, toml::Table>,
}

/// The loaded and validated declarative model.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root; link sources and preference files are relative to it.
    pub root: PathBuf,
    /// Path of the file the model was read from.
    pub file: PathBuf,
    /// Profiles by name.
    pub profiles: BTreeMap<String, Profile>,
}

impl Config {
    /// Load and validate the configuration file at `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation (every problem is reported at once).
    pub fn load(root: &Path, file: &Path) -> Result<Self, ConfigError> {
        let doc: ConfigFile = toml_loader::load_config(file)?;
        Self::from_document(doc, root, file)
    }

    /// Parse and validate configuration text as if it were read from `file`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus I/O failures.
    pub fn parse(content: &str, root: &Path, file: &Path) -> Result<Self, ConfigError> {
        let doc: ConfigFile = toml_loader::parse_config(content, file)?;
        Self::from_document(doc, root, file)
    }

    fn from_document(doc: ConfigFile, root: &Path, file: &Path) -> Result<Self, ConfigError> {
        let mut profiles = BTreeMap::new();
        for (name, table) in doc.profiles {
            let nodes = model::parse_nodes(&name, table).map_err(|message| ConfigError::Parse {
                file: file.display().to_string(),
                message,
            })?;
            profiles.insert(name.clone(), Profile { name, nodes });
        }

        let config = Self {
            root: root.to_path_buf(),
            file: file.to_path_buf(),
            profiles,
        };

        let problems = validation::problems(&config);
        if !problems.is_empty() {
            return Err(ConfigError::Invalid {
                file: file.display().to_string(),
                problems,
            });
        }
        Ok(config)
    }

    /// Non-fatal configuration warnings (missing files on disk).
    #[must_use]
    pub fn validate(&self) -> Vec<validation::ValidationWarning> {
        validation::warnings(self)
    }

    /// Whether `name` is a defined profile.
    #[must_use]
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Defined profile names, sorted.
    #[must_use]
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Look up a component definition by profile and dotted name, ignoring
    /// OS filters and profile activation.
    #[must_use]
    pub fn find_component(&self, profile: &str, name: &str) -> Option<&Component> {
        self.profiles.get(profile)?.find(name)
    }

    /// Total number of components across all profiles.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.profiles.values().map(|p| p.components().len()).sum()
    }
}
