//! Declarative workstation convergence.
//!
//! A TOML file describes profiles of components (packages to install,
//! dotfiles to symlink, hooks, macOS preference domains).  Each run resolves
//! the active profiles for this host, compares them with a JSON lock file of
//! what was applied before, and performs only the steps needed to converge,
//! including uninstalling components that left the configuration.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]** — parse and validate `dotstate.toml`, resolve profiles
//! - **[`state`]** — the lock file and its change-detection queries
//! - **[`resources`]** — idempotent `check + apply` primitives (symlinks, commands, preferences)
//! - **[`engine`]** — per-component convergence, uninstall and hook passes
//! - **[`commands`]** — top-level subcommand orchestration (`install`, `uninstall`, `status`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod state;
