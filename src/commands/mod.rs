//! Top-level subcommand orchestration.
pub mod defaults;
pub mod hooks;
pub mod install;
pub mod status;
pub mod uninstall;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::profiles::{self, Resolution};
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::engine::{Context, Engine, RunOptions, RunReport};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{ComponentStatus, Log, Logger};
use crate::platform::Platform;
use crate::state::{LOCK_FILE_NAME, StateStore};

/// Environment variable naming the repository root.
pub const ROOT_ENV: &str = "DOTSTATE_ROOT";

/// Profiles and fuzzy terms chosen for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSelection {
    /// Profiles to resolve (besides `"*"`).
    pub profiles: Vec<String>,
    /// Fuzzy terms narrowing the resolved components.
    pub terms: Vec<String>,
    /// Whether the profiles were named on the command line (as opposed to
    /// recalled from the lock file).
    pub explicit: bool,
}

/// Components for a run: the (possibly narrowed) selection and the full
/// resolution of the same profiles.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Components to process.
    pub selected: Resolution,
    /// Every component of the active profiles, ignoring fuzzy terms.
    pub full: Resolution,
}

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, root and path resolution, and
/// configuration loading so that each command does not have to repeat the
/// boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Lock file location.
    pub state_path: PathBuf,
}

impl CommandSetup {
    /// Detect the platform, resolve paths, and load the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be determined or the
    /// configuration fails to load or validate.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let platform = Platform::detect();
        let root = resolve_root(global)?;
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
        let state_path = resolve_state_path(
            global.state.as_deref(),
            std::env::var("XDG_STATE_HOME").ok(),
            crate::engine::home_dir().ok(),
        )?;

        log.stage("Loading configuration");
        log.debug(&format!("root: {}", root.display()));
        log.debug(&format!("lock file: {}", state_path.display()));
        let config = Config::load(&root, &config_path)?;
        log.info(&format!(
            "loaded {} profiles, {} components from {}",
            config.profiles.len(),
            config.component_count(),
            config_path.display()
        ));

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {}: {}", warning.item, warning.message));
            }
        }

        Ok(Self {
            platform,
            config: Arc::new(config),
            state_path,
        })
    }

    /// Load the lock file.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file exists but cannot be read or parsed.
    pub fn load_state(&self) -> Result<StateStore> {
        Ok(StateStore::load(&self.state_path)?)
    }

    /// Split positional `args` into profiles or fuzzy terms.
    ///
    /// If the first argument names a profile, every argument is a profile.
    /// Otherwise they are fuzzy terms and, unless `--profile` was given, the
    /// profiles of the last explicit run are recalled from the lock file.
    #[must_use]
    pub fn select(
        &self,
        global: &GlobalOpts,
        args: &[String],
        state: &StateStore,
        log: &dyn Log,
    ) -> ProfileSelection {
        select(&self.config, global, args, state, log)
    }

    /// Resolve `selection` on this host.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected profile does not exist.
    pub fn resolve(&self, selection: &ProfileSelection, log: &dyn Log) -> Result<Resolved> {
        resolve(&self.config, &self.platform, selection, log)
    }

    /// Build an engine that runs real commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn engine(&self, log: &Arc<Logger>, state: StateStore, options: RunOptions) -> Result<Engine> {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let log: Arc<dyn Log> = Arc::clone(log) as Arc<dyn Log>;
        let ctx = Context::new(
            Arc::clone(&self.config),
            self.platform.clone(),
            log,
            executor,
            options,
        )?;
        Ok(Engine::new(ctx, state))
    }
}

/// See [`CommandSetup::select`].
#[must_use]
pub fn select(
    config: &Config,
    global: &GlobalOpts,
    args: &[String],
    state: &StateStore,
    log: &dyn Log,
) -> ProfileSelection {
    let mut selection = ProfileSelection {
        profiles: global.profiles.clone(),
        ..ProfileSelection::default()
    };
    match args.first() {
        Some(first) if config.has_profile(first) => selection.profiles.extend_from_slice(args),
        _ => selection.terms = args.to_vec(),
    }

    selection.explicit = !selection.profiles.is_empty();
    if !selection.explicit {
        for name in state.active_profiles() {
            if config.has_profile(name) {
                selection.profiles.push(name.clone());
            } else {
                log.warn(&format!("remembered profile '{name}' is no longer defined"));
            }
        }
        if !selection.profiles.is_empty() {
            log.info(&format!("profiles: {}", selection.profiles.join(", ")));
        }
    }
    selection
}

/// See [`CommandSetup::resolve`].
///
/// # Errors
///
/// Returns an error if a selected profile does not exist.
pub fn resolve(
    config: &Config,
    platform: &Platform,
    selection: &ProfileSelection,
    log: &dyn Log,
) -> Result<Resolved> {
    let full = profiles::resolve(config, &selection.profiles, &[], &platform.os)?;
    for shadowed in &full.shadowed {
        log.debug(&format!(
            "{}.{} is shadowed by {}.{}",
            shadowed.profile, shadowed.name, shadowed.kept_from, shadowed.name
        ));
    }

    let selected = if selection.terms.is_empty() {
        full.clone()
    } else {
        profiles::resolve(config, &selection.profiles, &selection.terms, &platform.os)?
    };
    for term in &selected.unmatched_terms {
        log.warn(&format!("no component matches '{term}'"));
    }
    log.debug(&format!(
        "{} of {} components selected",
        selected.components.len(),
        full.components.len()
    ));
    Ok(Resolved { selected, full })
}

/// Resolve the repository root: `--root`, then `$DOTSTATE_ROOT`, then the
/// current directory.
///
/// # Errors
///
/// Returns an error if the chosen directory does not exist.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let root = match (&global.root, std::env::var(ROOT_ENV)) {
        (Some(root), _) => root.clone(),
        (None, Ok(root)) if !root.is_empty() => PathBuf::from(root),
        _ => std::env::current_dir().context("reading current directory")?,
    };
    dunce::canonicalize(&root)
        .with_context(|| format!("repository root {} does not exist", root.display()))
}

/// Resolve the lock file path: `explicit`, then
/// `$XDG_STATE_HOME/dotstate/lock.json`, then
/// `~/.local/state/dotstate/lock.json`.
///
/// # Errors
///
/// Returns an error if no explicit path is given and neither
/// `XDG_STATE_HOME` nor the home directory is known.
pub fn resolve_state_path(
    explicit: Option<&Path>,
    xdg_state_home: Option<String>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let base = match (xdg_state_home.filter(|s| !s.is_empty()), home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => home.join(".local").join("state"),
        (None, None) => anyhow::bail!("cannot locate the lock file; pass --state"),
    };
    Ok(base.join("dotstate").join(LOCK_FILE_NAME))
}

/// Print the summary and bail if any component failed.
///
/// # Errors
///
/// Returns an error if one or more components recorded a failure.
pub fn finish(report: &RunReport, log: &Logger) -> Result<()> {
    log.print_summary();

    let count = report.count(ComponentStatus::Failed);
    if count > 0 {
        anyhow::bail!("{count} component(s) failed");
    }
    Ok(())
}
