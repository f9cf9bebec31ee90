//! Candidate merging, scoring and selection
//!
//! The three stages run in order for every channel:
//!
//! 1. [`merge`] folds seed, mirror and harvester candidates by URL
//! 2. [`rank`] scores probed candidates and sorts them
//! 3. [`select`] applies the recency window, the per-channel limit and dedup

pub mod merge;
pub mod rank;
pub mod select;

pub use merge::{merge, merge_sources};
pub use rank::{rank, resolution_value, score, Weights, FALLBACK_RESOLUTION};
pub use select::{dedup_urls, is_recent, select_recent, total_urls};
