use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "updock")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Docker Hub update checker and compose service updater", long_about = None)]
pub struct Cli {
    /// Path to the services config file
    #[arg(short, long, default_value = "services.json", global = true)]
    pub config: String,

    /// Runs `check` when no subcommand is given
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare remote and local image digests for every tracked service
    Check {
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Show digests and error details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pull and restart every service with a newer remote image
    UpdateAll {
        /// Report intended actions without pulling or restarting
        #[arg(short, long)]
        dry_run: bool,

        /// Show digests and error details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pull and restart a single tracked service
    #[command(arg_required_else_help = true)]
    Update {
        /// Service name as listed in the config file
        service: String,

        /// Report intended actions without pulling or restarting
        #[arg(short, long)]
        dry_run: bool,

        /// Show digests and error details
        #[arg(short, long)]
        verbose: bool,
    },
}
