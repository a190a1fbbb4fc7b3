//! Audioroute CLI - check, inspect and simulate audio HAL routing configs.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "audioroute")]
#[command(author, version, about = "Audio HAL routing config tool", long_about = None)]
struct Cli {
    /// Increase log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a config against a virtual card and report problems
    Check(commands::check::CheckArgs),

    /// Print the compiled model
    Dump(commands::dump::DumpArgs),

    /// Run a stream and routing script and print the mixer writes
    Simulate(commands::simulate::SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Dump(args) => commands::dump::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
    }
}
