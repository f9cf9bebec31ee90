use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::RunParams;
use streamsift::config::{Config, LoadedConfig};

#[derive(Parser)]
#[command(
    name = "streamsift",
    version,
    about = "Curate a ranked, deduplicated live-stream URL list per channel",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the result file from the seed list, mirrors and search results
    Run {
        /// Configuration file (default: user_config.toml, then config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed channel-list file
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the search harvester
        #[arg(long, default_value = "false")]
        no_harvest: bool,

        /// Print the run summary as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Probe a single stream URL
    Probe {
        /// URL to probe
        url: String,

        /// Probe timeout in milliseconds
        #[arg(short, long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Show the resolved configuration and validate it
    Config {
        /// Configuration file (default: user_config.toml, then config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print as JSON instead of TOML
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Run { config, .. } | Commands::Config { config, .. } => config.clone(),
        Commands::Probe { .. } => None,
    };
    let loaded = Config::load(config_path.as_deref());

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| loaded.config.logging.format.clone());
    setup_tracing(&log_format, &loaded.config.logging.level, cli.verbose)?;

    tracing::info!(source = ?loaded.source, "streamsift starting");
    loaded.report();

    match cli.command {
        Commands::Run {
            source: seed,
            output,
            no_harvest,
            json,
            ..
        } => {
            let LoadedConfig {
                mut config, source, ..
            } = loaded;
            config.sanitize();
            tracing::info!(
                seed = ?seed,
                output = ?output,
                no_harvest = %no_harvest,
                "Starting run command"
            );
            let params = RunParams {
                source: seed,
                output,
                no_harvest,
                json,
            };
            commands::run(config, source, params).await?;
        }
        Commands::Probe { url, timeout_ms } => {
            tracing::info!(url = %url, timeout_ms = %timeout_ms, "Starting probe command");
            commands::probe_url(&url, timeout_ms).await?;
        }
        Commands::Config { json, .. } => {
            commands::show_config(&loaded, json)?;
        }
    }

    tracing::info!("streamsift completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("streamsift=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("streamsift={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
