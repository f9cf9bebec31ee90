//! Integration tests for the search-page harvester using wiremock

use std::time::Duration;
use streamsift::config::SearchEndpoint;
use streamsift::crawler::harvester::{candidates_from_hits, select_endpoint};
use streamsift::crawler::{Harvester, SearchPageHarvester};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(rows: &[(&str, &str, &str)], next: Option<u32>) -> String {
    let mut html = String::from("<html><body>");
    for (name, url, info) in rows {
        html.push_str(&format!(
            r#"<div class="resultplus"><div>{name}</div><div><tba>{url}</tba></div><div><i>{info}</i></div></div>"#
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(r#"<a href="?page={next}&s=CCTV1">{next}</a>"#));
    }
    html.push_str("</body></html>");
    html
}

fn endpoint(server: &MockServer) -> SearchEndpoint {
    SearchEndpoint {
        url: format!("{}/search", server.uri()),
        result_class: "resultplus".to_string(),
    }
}

/// Pagination follows next-page links and stops when they run out
#[tokio::test]
async fn test_harvest_follows_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("s", "CCTV1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[
                ("CCTV1", "http://a.test/1", "03-15-2024 •1920x1080"),
                ("CCTV10", "http://a.test/10", "03-15-2024 •1920x1080"),
            ],
            Some(2),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("CCTV1 综合", "http://b.test/1", "04-01-2024 •1280x720")],
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = SearchPageHarvester::new(endpoint(&mock_server), Duration::from_secs(5)).unwrap();
    let hits = harvester.harvest("CCTV1", 6).await;
    assert_eq!(hits.len(), 3);

    let candidates = candidates_from_hits(&hits, "CCTV1");
    let urls: Vec<&str> = candidates.iter().map(|c| c.url()).collect();
    assert_eq!(urls, vec!["http://a.test/1", "http://b.test/1"]);
    assert_eq!(candidates[1].source_channel_name.as_deref(), Some("CCTV1 综合"));
}

/// The page budget caps pagination even when more pages are linked
#[tokio::test]
async fn test_harvest_respects_page_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("CCTV1", "http://a.test/1", "03-15-2024 •1920x1080")],
            Some(2),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harvester = SearchPageHarvester::new(endpoint(&mock_server), Duration::from_secs(5)).unwrap();
    assert_eq!(harvester.harvest("CCTV1", 1).await.len(), 1);
}

/// A failing page ends the harvest with what was collected so far
#[tokio::test]
async fn test_harvest_stops_on_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("CCTV1", "http://a.test/1", "03-15-2024")],
            Some(2),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let harvester = SearchPageHarvester::new(endpoint(&mock_server), Duration::from_secs(5)).unwrap();
    let hits = harvester.harvest("CCTV1", 3).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].date.as_deref(), Some("03-15-2024"));
    assert!(hits[0].resolution.is_none());
}

/// Endpoint selection skips unreachable endpoints
#[tokio::test]
async fn test_select_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let endpoints = vec![
        SearchEndpoint {
            url: format!("{}/down", mock_server.uri()),
            result_class: "result".into(),
        },
        SearchEndpoint {
            url: format!("{}/up", mock_server.uri()),
            result_class: "resultplus".into(),
        },
    ];

    let chosen = select_endpoint(&endpoints, Duration::from_secs(5)).await.unwrap();
    assert_eq!(chosen.result_class, "resultplus");

    assert!(select_endpoint(&endpoints[..1], Duration::from_secs(5)).await.is_none());
}
