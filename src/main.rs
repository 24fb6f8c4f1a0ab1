mod commands;

use crate::commands::{Cli, Commands};
use clap::Parser;
use githubify::{Error, sysexits};
use std::process;

/// Entry point for the githubify CLI application.
/// Parses command-line arguments and dispatches to the appropriate command handler.
fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let commands = match cli.commands {
        Some(commands) => commands,
        None => {
            eprintln!(
                "githubify requires at least one command to execute. See 'githubify --help' for usage."
            );
            process::exit(sysexits::EX_USAGE);
        }
    };

    if let Err(e) = dispatch(commands) {
        eprintln!("Error: {e:#}");
        process::exit(exit_code(&e));
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Exit status for `err`: the sysexits code of the first githubify error in
/// its chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map_or(1, Error::exit_code)
}

fn dispatch(commands: Commands) -> anyhow::Result<()> {
    match commands {
        Commands::Split {
            source,
            destination,
            split,
            level,
            dry_run,
            yes,
            push,
            no_git,
            hosting,
        } => commands::split(
            source,
            destination,
            split,
            level,
            dry_run,
            yes,
            push,
            no_git,
            hosting,
        ),
        Commands::Push {
            destination,
            dry_run,
            hosting,
        } => commands::push(&destination, dry_run, hosting),
        Commands::Check => commands::check(),
        Commands::Config {
            copy,
            reset,
            rollback,
        } => {
            if copy {
                commands::backup_config_file()
            } else if reset {
                commands::reset_config_file()
            } else if rollback {
                commands::rollback_config_file()
            } else {
                commands::config()
            }
        }
    }
}
