use anyhow::{Context, Result};
use std::path::PathBuf;

use streamsift::config::{Config, ConfigSource};
use streamsift::pipeline::Pipeline;
use streamsift::storage::{read_seed, OutputPaths};

/// Options of the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    /// Seed file overriding `sources.source_file`
    pub source: Option<PathBuf>,

    /// Result file overriding `sources.final_file`
    pub output: Option<PathBuf>,

    /// Skip the search harvester
    pub no_harvest: bool,

    /// Print the run summary as JSON
    pub json: bool,
}

pub async fn run(mut config: Config, source: ConfigSource, params: RunParams) -> Result<()> {
    if let Some(output) = params.output {
        config.sources.final_file = output;
    }

    let seed_path = match params.source {
        Some(path) => path,
        None => config.sources.effective_source_file(),
    };

    let categories = read_seed(&seed_path)?;
    if categories.is_empty() {
        tracing::warn!(path = %seed_path.display(), "Seed file has no categories");
    }

    let paths = OutputPaths::new(&config.sources.final_file, source.is_user());
    let pipeline = Pipeline::from_config(&config, !params.no_harvest)
        .await
        .context("Failed to set up pipeline")?;

    let stats = pipeline
        .run(&categories, &paths)
        .await
        .context("Run failed")?;

    if params.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize run summary")?
        );
    } else {
        println!("Update completed! Please check the {} file!", paths.final_result.display());
        println!(
            "  Channels: {} ({} fallback), URLs written: {}, reachable: {:.1}%",
            stats.channels,
            stats.channels_fallback,
            stats.urls_written,
            stats.reachable_rate()
        );
    }

    Ok(())
}
