// Conveyor CLI
// Validate and run Conveyor pipeline files from the command line.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "conveyor", version, about = "Run CI pipelines locally")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a pipeline file, resolve templates, and validate the job graph
    Validate(commands::validate::ValidateArgs),
    /// Execute a pipeline
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate(args) => commands::validate::execute(args),
        Command::Run(args) => commands::run::execute(args).await,
    }
}
