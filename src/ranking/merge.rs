//! Merge engine
//!
//! Candidates for one channel arrive from three sources in a fixed order:
//! seed file, mirror lists, harvester. Same-URL candidates are folded into a
//! single entry whose fields are filled first-writer-wins: a field set by an
//! earlier source is never overwritten by a later one.

use std::collections::HashMap;

use crate::models::Candidate;

/// Merge `incoming` into `existing`
///
/// For each incoming candidate, an existing entry with the same URL gets its
/// missing fields filled from it; otherwise the candidate is appended. The
/// order of `existing` is kept and new URLs follow in incoming order. Neither
/// input is modified.
pub fn merge(existing: &[Candidate], incoming: &[Candidate]) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(existing.len() + incoming.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(existing.len());

    for candidate in existing.iter().chain(incoming) {
        match positions.get(candidate.url()) {
            Some(&idx) => {
                merged[idx] = merged[idx].merged_with(candidate);
            }
            None => {
                positions.insert(candidate.url().to_string(), merged.len());
                merged.push(candidate.clone());
            }
        }
    }

    merged
}

/// Merge several sources in precedence order
pub fn merge_sources<'a, I>(sources: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = &'a [Candidate]>,
{
    sources
        .into_iter()
        .fold(Vec::new(), |acc, source| merge(&acc, source))
}
