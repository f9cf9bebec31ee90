// Core data structures for the streamsift pipeline

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::utils::error::ParseError;

/// Date format used by search results and the result log
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Where a candidate was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Local seed channel-list file
    Seed,
    /// Auxiliary mirror list, by position in the configured list
    Mirror(usize),
    /// Search-result harvester
    Harvester,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => write!(f, "seed"),
            Self::Mirror(idx) => write!(f, "mirror#{idx}"),
            Self::Harvester => write!(f, "harvester"),
        }
    }
}

/// Stream resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse the first `WxH` run found in the text
    ///
    /// Search results decorate resolutions (`1920x1080p`, `•1280x720`), so the
    /// match is not anchored.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        static RESOLUTION_RE: OnceLock<Regex> = OnceLock::new();

        let re = RESOLUTION_RE
            .get_or_init(|| Regex::new(r"(\d+)x(\d+)").expect("Invalid regex pattern"));

        let caps = re
            .captures(text)
            .ok_or_else(|| ParseError::InvalidResolution(text.to_string()))?;

        let width = caps[1]
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidResolution(text.to_string()))?;
        let height = caps[2]
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidResolution(text.to_string()))?;

        Ok(Self { width, height })
    }

    /// Total pixel count
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parse an `MM-DD-YYYY` observation date
pub fn parse_observed_date(text: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(text.to_string()))
}

/// One stream URL plus whatever metadata its source knew about it
///
/// Candidates are values: merging builds a new candidate instead of mutating
/// the one already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    url: String,
    pub observed_date: Option<NaiveDate>,
    pub resolution: Option<Resolution>,
    pub source_channel_name: Option<String>,
    pub origin: Origin,
}

impl Candidate {
    /// Create a candidate for a URL
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingUrl` for blank URLs
    pub fn new(url: impl Into<String>, origin: Origin) -> Result<Self, ParseError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(ParseError::MissingUrl);
        }

        Ok(Self {
            url,
            observed_date: None,
            resolution: None,
            source_channel_name: None,
            origin,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.observed_date = date;
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_channel_name(mut self, name: Option<String>) -> Self {
        self.source_channel_name = name;
        self
    }

    /// Fill this candidate's missing fields from `other`
    ///
    /// Fields already set are kept; the URL and origin always come from `self`.
    #[must_use]
    pub fn merged_with(&self, other: &Candidate) -> Candidate {
        Candidate {
            url: self.url.clone(),
            observed_date: self.observed_date.or(other.observed_date),
            resolution: self.resolution.or(other.resolution),
            source_channel_name: self
                .source_channel_name
                .clone()
                .or_else(|| other.source_channel_name.clone()),
            origin: self.origin,
        }
    }
}

/// A candidate with its measured probe cost
///
/// `cost` is the latency in milliseconds, or `f64::INFINITY` if unreachable.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub cost: f64,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, cost: f64) -> Self {
        Self { candidate, cost }
    }

    pub fn url(&self) -> &str {
        self.candidate.url()
    }

    pub fn is_reachable(&self) -> bool {
        self.cost.is_finite()
    }
}

/// A named channel inside a category with its merged candidates
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub name: String,
    pub category: String,
    pub candidates: Vec<Candidate>,
}

/// Final output unit for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelUrlsResult {
    pub name: String,
    pub urls: Vec<String>,
}

/// Seed entry for one channel: its name and the URLs the seed file lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedChannel {
    pub name: String,
    pub urls: Vec<String>,
}

/// A category block of the seed file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub channels: Vec<SeedChannel>,
}

impl Category {
    /// All channel names of all categories, in file order
    pub fn channel_names(categories: &[Category]) -> Vec<String> {
        categories
            .iter()
            .flat_map(|c| c.channels.iter().map(|ch| ch.name.clone()))
            .collect()
    }
}

/// Statistics for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub categories: usize,
    pub channels: usize,
    pub candidates_probed: usize,
    pub candidates_reachable: usize,
    pub channels_fallback: usize,
    pub urls_written: usize,
    pub duration_secs: u64,
}

impl RunStats {
    /// Share of probed candidates that answered 200, as a percentage
    pub fn reachable_rate(&self) -> f64 {
        if self.candidates_probed == 0 {
            0.0
        } else {
            (self.candidates_reachable as f64 / self.candidates_probed as f64) * 100.0
        }
    }
}
