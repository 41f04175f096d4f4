mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blockwrap", about = "Package inference Docker images as UP42 blocks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an UP42-compliant build context from a packaging config
    Package {
        /// Packaging configuration (YAML)
        config: PathBuf,
        /// Output directory (created if missing)
        destination: PathBuf,
        /// Build the packaged image with `docker build` after writing
        #[arg(long)]
        build: bool,
        /// Check the manifest against the platform's block schema
        #[arg(long)]
        validate: bool,
        /// Upper bound in seconds for pulling the base image
        #[arg(long, value_name = "SECS")]
        pull_timeout: Option<u64>,
    },
    /// Check that the docker CLI and daemon are usable
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Package {
            config,
            destination,
            build,
            validate,
            pull_timeout,
        } => {
            let options = commands::PackageOptions {
                build,
                validate,
                pull_timeout,
            };
            commands::package(&config, &destination, &options).await?
        }
        Commands::Doctor => commands::doctor().await?,
    }

    Ok(())
}
