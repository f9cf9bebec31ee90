//! Aggregation pipeline
//!
//! Drives one batch run over the seed categories:
//!
//! ```text
//! seed ──┐
//! mirror ├─▶ merge ─▶ filter ─▶ probe (join_all) ─▶ rank ─▶ select ─▶ dedup ─▶ result file
//! search ┘                                            │
//!                                                     └─▶ result log
//! ```
//!
//! Categories and channels are processed one after another; only the probes
//! of a single channel run concurrently. Per-channel failures never abort the
//! run: a channel with nothing reachable falls back to its filtered seed URLs.
//! Only I/O on the output files is fatal.
//!
//! # Example
//!
//! ```no_run
//! use streamsift::config::Config;
//! use streamsift::pipeline::Pipeline;
//! use streamsift::storage::{read_seed, OutputPaths};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let categories = read_seed(&config.sources.effective_source_file())?;
//! let paths = OutputPaths::new(&config.sources.final_file, false);
//!
//! let pipeline = Pipeline::from_config(&config, true).await?;
//! let stats = pipeline.run(&categories, &paths).await?;
//! println!("Wrote {} URLs", stats.urls_written);
//! # Ok(())
//! # }
//! ```

use chrono::{Local, NaiveDateTime};
use std::time::Instant;

use crate::config::Config;
use crate::crawler::harvester::{candidates_from_hits, select_endpoint};
use crate::crawler::{Harvester, MirrorResolver, NoopHarvester, Prober, SearchPageHarvester, UrlFilter};
use crate::error::{Error, Result};
use crate::models::{Candidate, Category, Channel, ChannelUrlsResult, Origin, RunStats, ScoredCandidate, SeedChannel};
use crate::ranking::{merge_sources, rank, total_urls, Weights};
use crate::storage::{OutputPaths, ResultLog, ResultWriter};

/// What a single channel produced
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    /// Reachable candidates in rank order, before selection
    pub ranked: Vec<ScoredCandidate>,

    /// URLs written for the channel
    pub urls: Vec<String>,

    /// Number of candidates probed
    pub probed: usize,

    /// True when the filtered seed URLs were used instead of ranked ones
    pub fallback: bool,
}

/// Batch pipeline over seed categories
pub struct Pipeline {
    config: Config,
    filter: UrlFilter,
    prober: Prober,
    weights: Weights,
    mirror: MirrorResolver,
    harvester: Box<dyn Harvester>,
    now: Option<NaiveDateTime>,
}

impl Pipeline {
    /// Create a pipeline with an explicit harvester
    ///
    /// # Errors
    ///
    /// - `Error::Config` if `config` does not validate; sanitize it first
    /// - `Error::Fetch` if the mirror HTTP client cannot be created
    pub fn new(config: &Config, harvester: Box<dyn Harvester>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        let mirror = MirrorResolver::new(
            config.sources.extend_base_urls.clone(),
            config.prober.mirror_timeout(),
        )?;

        Ok(Self {
            config: config.clone(),
            filter: UrlFilter::new(&config.filter),
            prober: Prober::new(config.prober.timeout()),
            weights: Weights::from(&config.selection),
            mirror,
            harvester,
            now: None,
        })
    }

    /// Create a pipeline, picking the fastest search endpoint when
    /// harvesting is enabled
    ///
    /// With no reachable endpoint the run continues without search results.
    pub async fn from_config(config: &Config, harvest: bool) -> Result<Self> {
        let harvester: Box<dyn Harvester> = if harvest {
            match select_endpoint(
                &config.sources.search_endpoints,
                config.prober.endpoint_timeout(),
            )
            .await
            {
                Some(endpoint) => {
                    tracing::info!(endpoint = %endpoint.url, "Using search endpoint");
                    Box::new(SearchPageHarvester::new(endpoint, config.prober.endpoint_timeout())?)
                }
                None => {
                    tracing::warn!("No search endpoint reachable, continuing without search results");
                    Box::new(NoopHarvester)
                }
            }
        } else {
            Box::new(NoopHarvester)
        };

        Self::new(config, harvester)
    }

    /// Pin the reference time used by the recency window
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run over all categories and promote the outputs
    pub async fn run(&self, categories: &[Category], paths: &OutputPaths) -> Result<RunStats> {
        let started = Instant::now();
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());

        let channel_names = Category::channel_names(categories);
        let mirror_candidates = self.mirror.resolve(&channel_names).await;

        let writer = ResultWriter::create(&paths.staging_result)?;
        let mut log = ResultLog::create(&paths.staging_log)?;

        let mut stats = RunStats {
            categories: categories.len(),
            ..Default::default()
        };
        let cap = self.config.prober.max_probed_channels;
        let total = channel_names.len();

        for category in categories {
            tracing::info!(category = %category.name, channels = category.channels.len(), "Processing category");
            let mut results = Vec::with_capacity(category.channels.len());

            for seed in &category.channels {
                let position = stats.channels;
                stats.channels += 1;

                // exactly `cap` channels are probed
                let outcome = if cap.is_some_and(|cap| position >= cap) {
                    tracing::debug!(channel = %seed.name, "Probe cap reached, using seed URLs");
                    self.fallback(seed)
                } else {
                    let mirrored = mirror_candidates
                        .get(&seed.name)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    self.process_channel(&category.name, seed, mirrored, now).await
                };

                log.record(&seed.name, &outcome.ranked)?;

                stats.candidates_probed += outcome.probed;
                stats.candidates_reachable += outcome.ranked.len();
                stats.urls_written += outcome.urls.len();
                if outcome.fallback {
                    stats.channels_fallback += 1;
                }

                tracing::info!(
                    channel = %seed.name,
                    probed = outcome.probed,
                    reachable = outcome.ranked.len(),
                    urls = outcome.urls.len(),
                    fallback = outcome.fallback,
                    remaining = total - stats.channels,
                    "Channel processed"
                );

                results.push(ChannelUrlsResult {
                    name: seed.name.clone(),
                    urls: outcome.urls,
                });
            }

            writer.write_category(&category.name, &results)?;

            let pause = self.config.prober.category_pause();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        writer.promote(&paths.final_result)?;
        log.promote(&paths.final_log)?;

        stats.duration_secs = started.elapsed().as_secs();
        tracing::info!(
            categories = stats.categories,
            channels = stats.channels,
            probed = stats.candidates_probed,
            reachable_pct = stats.reachable_rate(),
            fallback = stats.channels_fallback,
            urls = stats.urls_written,
            duration_secs = stats.duration_secs,
            "Run finished"
        );

        Ok(stats)
    }

    /// Gather, probe, rank and select the URLs of one channel
    pub async fn process_channel(
        &self,
        category: &str,
        seed: &SeedChannel,
        mirrored: &[Candidate],
        now: NaiveDateTime,
    ) -> ChannelOutcome {
        let channel = self.gather(category, seed, mirrored).await;
        let accepted = channel.candidates;

        let urls: Vec<&str> = accepted.iter().map(Candidate::url).collect();
        let costs = self.prober.probe_all(&urls).await;
        let probed = accepted.len();

        let scored = accepted
            .into_iter()
            .zip(costs)
            .map(|(candidate, cost)| ScoredCandidate::new(candidate, cost))
            .collect();
        let ranked = rank(scored, &self.weights);

        if ranked.is_empty() {
            return ChannelOutcome {
                probed,
                ..self.fallback(seed)
            };
        }

        let urls = total_urls(
            &ranked,
            self.config.selection.limit(),
            self.config.selection.recent_days,
            now,
        );

        ChannelOutcome {
            ranked,
            urls,
            probed,
            fallback: false,
        }
    }

    /// Merge seed, mirror and search candidates and keep the acceptable ones
    async fn gather(&self, category: &str, seed: &SeedChannel, mirrored: &[Candidate]) -> Channel {
        let seeded = seed_candidates(seed);

        let pages = self.config.sources.page_num_for(&seed.name);
        let hits = self.harvester.harvest(&seed.name, pages).await;
        let harvested = candidates_from_hits(&hits, &seed.name);

        let merged = merge_sources([seeded.as_slice(), mirrored, harvested.as_slice()]);
        let candidates: Vec<Candidate> = merged
            .into_iter()
            .filter(|c| self.filter.accept(c.url()))
            .collect();

        tracing::debug!(
            category = %category,
            channel = %seed.name,
            seed = seeded.len(),
            mirror = mirrored.len(),
            harvested = harvested.len(),
            accepted = candidates.len(),
            "Candidates gathered"
        );

        Channel {
            name: seed.name.clone(),
            category: category.to_string(),
            candidates,
        }
    }

    /// Filtered seed URLs of a channel, unprobed
    fn fallback(&self, seed: &SeedChannel) -> ChannelOutcome {
        ChannelOutcome {
            ranked: Vec::new(),
            urls: self.filter.filter_urls(&seed.urls),
            probed: 0,
            fallback: true,
        }
    }
}

/// Seed URLs of a channel as candidates
fn seed_candidates(seed: &SeedChannel) -> Vec<Candidate> {
    seed.urls
        .iter()
        .filter_map(|url| Candidate::new(url.as_str(), Origin::Seed).ok())
        .collect()
}
