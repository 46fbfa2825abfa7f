mod cli;
mod config;
mod update;
mod utils;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Check {
        output: "text".to_string(),
        verbose: false,
    }) {
        Commands::Check { output, verbose } => {
            update::run_check(&cli.config, &output, verbose)
        }
        Commands::UpdateAll { dry_run, verbose } => {
            update::run_update_all(&cli.config, dry_run, verbose)
        }
        Commands::Update { service, dry_run, verbose } => {
            update::run_update_one(&cli.config, &service, dry_run, verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
