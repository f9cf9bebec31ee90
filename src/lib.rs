//! streamsift - live-stream channel list curator
//!
//! Builds a deduplicated, ranked list of live-stream URLs per channel from a
//! seed channel list, auxiliary mirror lists and search-result pages.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - URL filter, prober, mirror resolver and search harvester
//! - [`ranking`] - Merge, scoring, recency selection and dedup
//! - [`storage`] - Seed file reader and result output
//! - [`pipeline`] - Per-category, per-channel orchestration
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use streamsift::config::Config;
//! use streamsift::pipeline::Pipeline;
//! use streamsift::storage::{read_seed, OutputPaths};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let (config, source) = Config::resolve(None);
//!     let categories = read_seed(&config.sources.effective_source_file())?;
//!     let paths = OutputPaths::new(&config.sources.final_file, source.is_user());
//!
//!     let pipeline = Pipeline::from_config(&config, true).await?;
//!     pipeline.run(&categories, &paths).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSource};
    pub use crate::crawler::{Harvester, Prober, UrlFilter};
    pub use crate::error::{Error, ErrorCategory, Result, SiftErrorTrait};
    pub use crate::models::{Candidate, Category, ChannelUrlsResult, Origin, Resolution, RunStats, ScoredCandidate};
    pub use crate::pipeline::Pipeline;
    pub use crate::ranking::Weights;
    pub use crate::storage::OutputPaths;
}

// Direct re-exports for convenience
pub use models::{Candidate, ChannelUrlsResult, ScoredCandidate};
