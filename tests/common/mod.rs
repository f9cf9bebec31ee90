//! Common test utilities

use chrono::{NaiveDate, NaiveDateTime};
use streamsift::config::Config;
use streamsift::models::{Candidate, Origin, Resolution, ScoredCandidate};

/// Configuration that never touches the public search endpoints and does
/// not pause between categories
#[allow(dead_code)]
pub fn offline_config() -> Config {
    let mut config = Config::default();
    config.sources.search_endpoints.clear();
    config.prober.timeout_ms = 2000;
    config.prober.category_pause_ms = 0;
    config
}

/// Fixed reference time for recency checks
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Create a scored candidate with optional metadata
#[allow(dead_code)]
pub fn scored(
    url: &str,
    cost: f64,
    date: Option<NaiveDate>,
    resolution: Option<Resolution>,
) -> ScoredCandidate {
    ScoredCandidate::new(
        Candidate::new(url, Origin::Harvester)
            .unwrap()
            .with_date(date)
            .with_resolution(resolution),
        cost,
    )
}
