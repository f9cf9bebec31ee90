//! Network-facing candidate sources and probing
//!
//! - [`url`] - URL acceptability filter
//! - [`prober`] - liveness/latency probes
//! - [`mirror`] - mirror-list resolver
//! - [`harvester`] - search-result harvester boundary

pub mod harvester;
pub mod mirror;
pub mod prober;
pub mod url;

pub use harvester::{Harvester, NoopHarvester, RawHit, SearchPageHarvester};
pub use mirror::MirrorResolver;
pub use prober::{probe, Prober, UNREACHABLE};
pub use url::UrlFilter;
