//! Property tests for merge, selection and dedup

mod common;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::HashSet;
use streamsift::models::{Candidate, Origin, Resolution};
use streamsift::ranking::{dedup_urls, merge, rank, select_recent, total_urls, Weights};
use streamsift::utils::is_ipv6;

use common::{fixed_now, scored};

fn url_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..8).prop_map(|n| format!("http://h{n}.test/live")),
        (0u8..4).prop_map(|n| format!("http://[2409:8087::{n}]/live")),
    ]
}

fn candidate_strategy() -> impl Strategy<Value = Candidate> {
    (
        url_strategy(),
        proptest::option::of(0i64..400),
        proptest::option::of((1u32..4000, 1u32..3000)),
    )
        .prop_map(|(url, age, res)| {
            Candidate::new(url, Origin::Harvester)
                .unwrap()
                .with_date(age.map(|days| fixed_now().date() - Duration::days(days)))
                .with_resolution(res.map(|(w, h)| Resolution::new(w, h)))
        })
}

fn scored_strategy() -> impl Strategy<Value = Vec<streamsift::models::ScoredCandidate>> {
    prop::collection::vec(
        (
            url_strategy(),
            proptest::option::of(0i64..400),
            1.0f64..5000.0,
        ),
        0..30,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(url, age, cost)| {
                let date: Option<NaiveDate> = age.map(|days| fixed_now().date() - Duration::days(days));
                scored(&url, cost.round(), date, None)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_never_loses_a_set_field(
        existing in prop::collection::vec(candidate_strategy(), 0..15),
        incoming in prop::collection::vec(candidate_strategy(), 0..15),
    ) {
        let merged = merge(&existing, &incoming);

        // one entry per distinct URL
        let urls: HashSet<&str> = merged.iter().map(|c| c.url()).collect();
        prop_assert_eq!(urls.len(), merged.len());

        // a field set by the first carrier of a URL survives unchanged
        for c in &merged {
            let first = existing
                .iter()
                .chain(&incoming)
                .find(|e| e.url() == c.url())
                .unwrap();
            if first.resolution.is_some() {
                prop_assert_eq!(c.resolution, first.resolution);
            }
            if first.observed_date.is_some() {
                prop_assert_eq!(c.observed_date, first.observed_date);
            }
        }
    }

    #[test]
    fn dedup_output_is_unique_and_ordered(urls in prop::collection::vec(url_strategy(), 0..40)) {
        let deduped = dedup_urls(urls.iter().cloned());

        let unique: HashSet<&String> = deduped.iter().collect();
        prop_assert_eq!(unique.len(), deduped.len());

        // first occurrences, in input order
        let mut seen = HashSet::new();
        let expected: Vec<String> = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();
        prop_assert_eq!(deduped, expected);
    }

    #[test]
    fn selection_within_limit_is_identity(ranked in scored_strategy(), extra in 0usize..5) {
        let limit = ranked.len() + extra;
        let selected = select_recent(ranked.clone(), limit, 60, fixed_now());
        prop_assert_eq!(selected, ranked);
    }

    #[test]
    fn selection_respects_limit(ranked in scored_strategy(), limit in 1usize..12) {
        let ranked = rank(ranked, &Weights::default());
        let urls = total_urls(&ranked, limit, 60, fixed_now());

        prop_assert!(urls.len() <= limit);
        let unique: HashSet<&String> = urls.iter().collect();
        prop_assert_eq!(unique.len(), urls.len());
        for url in &urls {
            prop_assert!(ranked.iter().any(|c| c.url() == url));
        }
    }

    #[test]
    fn recent_ipv6_survives_selection(ranked in scored_strategy(), limit in 1usize..12) {
        let selected = select_recent(ranked.clone(), limit, 60, fixed_now());

        let recent_count = ranked
            .iter()
            .filter(|c| streamsift::ranking::is_recent(c, 60, fixed_now()))
            .count();
        let recent_has_ipv6 = ranked
            .iter()
            .any(|c| streamsift::ranking::is_recent(c, 60, fixed_now()) && is_ipv6(c.url()));

        // when recent candidates alone fill the limit, one IPv6 among them is kept
        if ranked.len() > limit && recent_count >= limit && recent_has_ipv6 {
            prop_assert!(selected.iter().any(|c| is_ipv6(c.url())));
        }
    }
}
