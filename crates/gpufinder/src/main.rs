mod commands;
mod progress;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gpu-finder")]
#[command(
    about = "Find Compute Engine zones with GPU capacity and provision instances across them",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to GPU_FINDER_CONFIG, then ./gpu-config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OAuth access token for the Compute Engine API (falls back to gcloud)
    #[arg(
        long,
        global = true,
        env = "GOOGLE_OAUTH_ACCESS_TOKEN",
        hide_env_values = true
    )]
    access_token: Option<String>,

    /// Pause between operation status checks, in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find capacity, create the instances, then delete them
    Run {
        /// Delete the instances without waiting for Enter
        #[arg(short, long)]
        yes: bool,
    },
    /// Report the zones that can host the configured machine, without creating anything
    Find,
    /// List every accelerator type offered in the usable zones
    Accelerators,
    /// Load and validate the configuration file
    Validate,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the user-facing report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli.config.as_deref();
    let token = cli.access_token.as_deref();
    let poll_interval = Duration::from_millis(cli.poll_interval_ms);

    match cli.command {
        Commands::Version => {
            println!("gpu-finder {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate => commands::validate::handle(config)?,
        Commands::Find => commands::find::handle(config, token).await?,
        Commands::Accelerators => commands::accelerators::handle(config, token).await?,
        Commands::Run { yes } => commands::run::handle(config, token, poll_interval, yes).await?,
    }

    Ok(())
}
