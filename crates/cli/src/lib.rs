pub mod commands;
#[cfg(test)]
mod test_support;
pub mod util;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{replay, show};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lazytree", version, about = "Drive a lazily loaded tree view over JSON data")]
pub struct Cli {
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        global = true,
        help = "Log filter used when RUST_LOG is not set (e.g. debug, lazytree_runtime=trace)."
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the visible rows after expanding the first levels.
    Show(show::ShowArgs),
    /// Apply a sequence of tree events and print the resulting rows.
    Replay(replay::ReplayArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let output = match &cli.command {
        Command::Show(args) => show::run(args)?,
        Command::Replay(args) => replay::run(args)?,
    };
    println!("{output}");
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
