//! Domain-specific error types for the convergence engine.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`StateError`]) while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DotstateError
//! ├── Config(ConfigError)       — config parsing, validation, profile lookup
//! ├── State(StateError)         — lock file read/write/parse
//! └── Component(ComponentError) — per-component install/link/hook failures
//! ```
//!
//! `Config` and `State` errors abort a run before (or while) components are
//! processed.  `Component` errors never cross a component boundary: the
//! engine attaches them to that component's result and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the engine.
#[derive(Error, Debug)]
pub enum DotstateError {
    /// Configuration-related error (parsing, validation, profile lookup).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Lock file error.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Per-component failure.
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),
}

/// Errors that arise from configuration loading and profile resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A requested profile is not defined in the config file.
    #[error("unknown profile '{name}' (available: {available})")]
    UnknownProfile {
        /// The requested profile name.
        name: String,
        /// Comma-separated list of defined profiles.
        available: String,
    },

    /// The config file parsed but failed schema validation.
    #[error("invalid configuration in {file}:\n  {}", problems.join("\n  "))]
    Invalid {
        /// Config file that failed validation.
        file: String,
        /// One line per problem found.
        problems: Vec<String>,
    },

    /// The config file is not valid TOML or does not match the schema.
    #[error("failed to parse {file}: {message}")]
    Parse {
        /// Config file that failed to parse.
        file: String,
        /// Parser diagnostic.
        message: String,
    },

    /// An I/O error occurred while reading the config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while reading or writing the lock file.
///
/// Every variant is fatal for the run: state integrity cannot be assumed
/// after a partial read or write.
#[derive(Error, Debug)]
pub enum StateError {
    /// The lock file exists but could not be read.
    #[error("failed to read lock file {path}: {source}")]
    Read {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The lock file (or its directory) could not be written.
    #[error("failed to write lock file {path}: {source}")]
    Write {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The lock file is not valid JSON or does not match the schema.
    #[error("corrupt lock file {path}: {source}")]
    Parse {
        /// Lock file path.
        path: PathBuf,
        /// Underlying deserialization error.
        source: serde_json::Error,
    },
}

/// Per-component failures attached to a component's result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// None of the install (or uninstall) table's managers is on PATH.
    #[error("no available command (tried: {tried})")]
    NoAvailableCommand {
        /// Comma-separated manager names that were tried.
        tried: String,
    },

    /// A shell command exited non-zero or could not be spawned.
    #[error("{stage} command failed (exit {code}): {command}")]
    CommandFailed {
        /// Which step ran the command (`install`, `postInstall`, …).
        stage: String,
        /// The shell command text.
        command: String,
        /// Exit code, or `-1` when the process was killed or never started.
        code: i32,
        /// Captured stdout and stderr.
        output: String,
    },

    /// A link could not be created or verified.
    #[error("link {dest} failed: {reason}")]
    LinkFailed {
        /// Destination path of the link.
        dest: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl ComponentError {
    /// Captured command output, if this failure carries any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}
