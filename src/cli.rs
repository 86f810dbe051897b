//! Command-line surface: global options and one subcommand per operation.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "dotstate",
    about = "Converge a workstation onto a declarative package and dotfile description",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Show debug output (overridden by `DOTSTATE_LOG`)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Profiles to activate (comma-separated, repeatable)
    #[arg(short, long = "profile", global = true, value_delimiter = ',')]
    pub profiles: Vec<String>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Repository root (default: $DOTSTATE_ROOT, then the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file (default: <root>/dotstate.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Lock file (default: $XDG_STATE_HOME/dotstate/lock.json)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install and link components, then remove what is no longer configured
    Install(InstallOpts),
    /// Uninstall tracked components
    Uninstall(UninstallOpts),
    /// Show resolved components and what is recorded for them
    Status(SelectOpts),
    /// Run postInstall and postLink hooks regardless of changes
    Hooks(SelectOpts),
    /// Sync macOS preference domains with the repository
    Defaults(DefaultsOpts),
    /// Print a shell completion script
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallOpts {
    /// Profiles to install, or fuzzy terms narrowing the remembered profiles
    pub args: Vec<String>,

    /// Reinstall every component and back up conflicting link targets
    #[arg(short, long)]
    pub force: bool,

    /// Back up conflicting link targets instead of failing
    #[arg(long)]
    pub backup: bool,
}

/// Options for the `uninstall` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct UninstallOpts {
    /// Only uninstall tracked components matching these terms
    pub terms: Vec<String>,
}

/// Profile or fuzzy-term selection shared by `status` and `hooks`.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectOpts {
    /// Profiles, or fuzzy terms narrowing the remembered profiles
    pub args: Vec<String>,
}

/// Direction of a preferences sync.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultsAction {
    /// Write live preferences into the repository files
    Export,
    /// Load the repository files into live preferences
    Import,
    /// Report domains whose live preferences differ from the files
    Diff,
}

/// Options for the `defaults` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DefaultsOpts {
    /// What to do
    #[arg(value_enum)]
    pub action: DefaultsAction,

    /// Profiles, or fuzzy terms narrowing the remembered profiles
    pub args: Vec<String>,
}

/// Options for the `completions` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
