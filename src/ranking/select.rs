//! Recency/cardinality selection and URL deduplication
//!
//! Selection only runs for channels with more ranked candidates than
//! `urls_limit`. It prefers candidates seen within the recency window (or with
//! no date at all), tops up from older ones in rank order, and keeps one IPv6
//! candidate alive past the cutoff by overwriting the last kept slot.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::HashSet;

use crate::models::ScoredCandidate;
use crate::utils::is_ipv6;

/// Whether a candidate counts as recent
///
/// Undated candidates are recent. A dated candidate is recent when midnight
/// of its date is not earlier than `now - recent_days`.
pub fn is_recent(candidate: &ScoredCandidate, recent_days: i64, now: NaiveDateTime) -> bool {
    match candidate.candidate.observed_date {
        None => true,
        Some(date) => date.and_time(NaiveTime::MIN) >= now - Duration::days(recent_days),
    }
}

/// Apply the recency window and the per-channel limit
///
/// - At most `limit` candidates: returned unchanged.
/// - Otherwise recent candidates come first, topped up with older ones in
///   rank order when fewer than `limit` are recent.
/// - When recent candidates alone fill the limit, the first IPv6 candidate in
///   their order is copied into slot `limit - 1` if it sits at or past
///   `limit`. Only that first IPv6 candidate is considered.
pub fn select_recent(
    ranked: Vec<ScoredCandidate>,
    limit: usize,
    recent_days: i64,
    now: NaiveDateTime,
) -> Vec<ScoredCandidate> {
    if ranked.len() <= limit {
        return ranked;
    }
    if limit == 0 {
        return Vec::new();
    }

    let (mut recent, older): (Vec<_>, Vec<_>) = ranked
        .into_iter()
        .partition(|c| is_recent(c, recent_days, now));

    if recent.len() < limit {
        let missing = limit - recent.len();
        recent.extend(older.into_iter().take(missing));
    } else if let Some(idx) = recent.iter().position(|c| is_ipv6(c.url())) {
        if idx >= limit {
            recent[limit - 1] = recent[idx].clone();
        }
    }

    recent.truncate(limit);
    recent
}

/// Remove later duplicates, keeping first-occurrence order
pub fn dedup_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(Into::into)
        .filter(|url: &String| seen.insert(url.clone()))
        .collect()
}

/// Final URL list of a channel from its ranked candidates
///
/// Selection is skipped when the channel has no more than `limit` ranked
/// candidates; deduplication always runs.
pub fn total_urls(
    ranked: &[ScoredCandidate],
    limit: usize,
    recent_days: i64,
    now: NaiveDateTime,
) -> Vec<String> {
    if ranked.len() > limit {
        let selected = select_recent(ranked.to_vec(), limit, recent_days, now);
        dedup_urls(selected.iter().map(|c| c.url().to_string()))
    } else {
        dedup_urls(ranked.iter().map(|c| c.url().to_string()))
    }
}
