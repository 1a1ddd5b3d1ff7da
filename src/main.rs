//! thira CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use thira::cli::commands;
use thira::cli::{Cli, Commands, SyncArgs};
use thira::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = cli.config.as_deref();
    let state = cli.state.as_deref();

    match &cli.command {
        // Bare `thira` runs a default sync
        None => commands::sync::execute(&SyncArgs::default(), config, state, cli.json),
        Some(Commands::Sync(args)) => commands::sync::execute(args, config, state, cli.json),

        Some(Commands::Status { ids }) => commands::status::execute(*ids, state, cli.json),
        Some(Commands::Reset) => commands::reset::execute(state, cli.json),
        Some(Commands::Remove { ids }) => commands::remove::execute(ids, state, cli.json),

        Some(Commands::Init { force }) => commands::init::execute(*force, config, cli.json),
        Some(Commands::Completions { shell }) => commands::completions::execute(shell),
        Some(Commands::Version) => commands::version::execute(cli.json),
    }
}
