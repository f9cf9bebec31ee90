//! Ranking engine
//!
//! ```text
//! resolution_value = width * height            (resolution known)
//!                  = FALLBACK_RESOLUTION pixels (unknown or unparseable)
//! score = -(response_time_weight * cost) + resolution_weight * resolution_value
//! ```
//!
//! Higher scores rank first. The sort is stable, so candidates with equal
//! scores keep their merge order (seed before mirror before harvester).

use crate::config::{weights_valid, SelectionConfig, DEFAULT_RESOLUTION_WEIGHT, DEFAULT_RESPONSE_TIME_WEIGHT};
use crate::models::{Resolution, ScoredCandidate};

/// Resolution assumed for candidates that report none
///
/// A fast stream of unknown resolution must still beat a slow stream with a
/// small known resolution, so this is a low real resolution, not zero.
pub const FALLBACK_RESOLUTION: Resolution = Resolution::new(720, 576);

/// Validated score weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    response_time: f64,
    resolution: f64,
}

impl Weights {
    /// Build weights, falling back to 0.5/0.5 unless both lie in `[0, 1]` and
    /// sum to 1
    pub fn new(response_time: f64, resolution: f64) -> Self {
        if weights_valid(response_time, resolution) {
            Self {
                response_time,
                resolution,
            }
        } else {
            Self::default()
        }
    }

    pub fn response_time(&self) -> f64 {
        self.response_time
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            response_time: DEFAULT_RESPONSE_TIME_WEIGHT,
            resolution: DEFAULT_RESOLUTION_WEIGHT,
        }
    }
}

impl From<&SelectionConfig> for Weights {
    fn from(config: &SelectionConfig) -> Self {
        Self::new(config.response_time_weight, config.resolution_weight)
    }
}

/// Pixel count used for scoring
pub fn resolution_value(resolution: Option<Resolution>) -> f64 {
    resolution.unwrap_or(FALLBACK_RESOLUTION).pixels() as f64
}

/// Score of one probed candidate
pub fn score(candidate: &ScoredCandidate, weights: &Weights) -> f64 {
    -(weights.response_time * candidate.cost)
        + weights.resolution * resolution_value(candidate.candidate.resolution)
}

/// Drop unreachable candidates and sort the rest by descending score
pub fn rank(candidates: Vec<ScoredCandidate>, weights: &Weights) -> Vec<ScoredCandidate> {
    let mut scored: Vec<(f64, ScoredCandidate)> = candidates
        .into_iter()
        .filter(ScoredCandidate::is_reachable)
        .map(|c| (score(&c, weights), c))
        .collect();

    // sort_by is stable: ties keep input order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored.into_iter().map(|(_, c)| c).collect()
}
