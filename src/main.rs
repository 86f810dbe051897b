//! Command-line entry point for dotstate.

use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};

use dotstate::cli::{Cli, Command};
use dotstate::commands;
use dotstate::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let name = match &args.command {
        Command::Install(_) => "install",
        Command::Uninstall(_) => "uninstall",
        Command::Status(_) => "status",
        Command::Hooks(_) => "hooks",
        Command::Defaults(_) => "defaults",
        Command::Completions(opts) => {
            clap_complete::generate(
                opts.shell,
                &mut Cli::command(),
                "dotstate",
                &mut std::io::stdout(),
            );
            return Ok(());
        }
        Command::Version => {
            let version = option_env!("DOTSTATE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("dotstate {version}");
            return Ok(());
        }
    };

    init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));

    match &args.command {
        Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        Command::Uninstall(opts) => commands::uninstall::run(&args.global, opts, &log),
        Command::Status(opts) => commands::status::run(&args.global, opts, &log),
        Command::Hooks(opts) => commands::hooks::run(&args.global, opts, &log),
        Command::Defaults(opts) => commands::defaults::run(&args.global, opts, &log),
        Command::Completions(_) | Command::Version => Ok(()),
    }
}
