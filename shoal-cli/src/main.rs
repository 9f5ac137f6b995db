//! Shoal CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use shoal_config::{load_config, LogFormat};
use shoal_runtime::{ServerBuilder, SignalHandler};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "shoal")]
#[command(about = "Static asset server with pre-compressed responses", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "shoal.yaml", env = "SHOAL_CONFIG")]
        config: PathBuf,

        /// Log level override (trace, debug, info, warn, error)
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "shoal.yaml", env = "SHOAL_CONFIG")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            let path = config;
            let config = load_config(&path)?;

            let level = log_level.as_deref().unwrap_or(&config.logging.level);
            init_tracing(level, config.logging.format)?;

            tracing::info!(
                config = %path.display(),
                listen = %config.server.listen,
                root = %config.assets.root.display(),
                "Configuration loaded"
            );

            let server = ServerBuilder::new().config(config).build()?;

            let shutdown_signal = server.shutdown_signal();
            tokio::spawn(async move {
                SignalHandler::new(shutdown_signal).run().await;
            });

            server.run().await?;
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.server.listen);
                    tracing::info!("  Root: {}", cfg.assets.root.display());
                    tracing::info!("  Mount: {}", cfg.assets.mount);
                    tracing::info!(
                        "  Precompression: {} (max {} bytes)",
                        if cfg.precompression.enabled { "on" } else { "off" },
                        cfg.precompression.max_size
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Shoal");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let level: tracing::Level = level.parse()?;
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let json = matches!(format, LogFormat::Json);

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_target(false)))
        .with(
            (!json).then(|| {
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
            }),
        )
        .init();

    Ok(())
}
