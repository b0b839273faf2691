//! Exevo CLI entry point.

use clap::Parser;

use exevo::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => exevo::cli::commands::run::execute(args, cli.json).await,
        Commands::Config(args) => exevo::cli::commands::config::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        exevo::cli::handle_error(err, cli.json);
    }
}
