//! Integration tests for the mirror-list resolver using wiremock

use std::time::Duration;
use streamsift::crawler::MirrorResolver;
use streamsift::models::{Origin, Resolution};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "\
央视频道,#genre#
CCTV-1_(1920x1080),http://m.test/cctv1-hd
CCTV1,http://m.test/cctv1
CCTV10,http://m.test/cctv10
湖南卫视频道,http://m.test/hunan
broken line without comma
CCTV2,
";

/// A failing mirror is skipped and the next one still contributes
#[tokio::test]
async fn test_failing_mirror_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list.txt"))
        .and(header("user-agent", "okhttp/3.15"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .mount(&mock_server)
        .await;

    let resolver = MirrorResolver::new(
        vec![
            format!("{}/broken.txt", mock_server.uri()),
            "http://127.0.0.1:9/refused.txt".to_string(),
            format!("{}/list.txt", mock_server.uri()),
        ],
        Duration::from_secs(5),
    )
    .unwrap();

    let names = vec!["CCTV1".to_string(), "湖南卫视".to_string(), "CCTV5".to_string()];
    let resolved = resolver.resolve(&names).await;

    let cctv1 = &resolved["CCTV1"];
    assert_eq!(cctv1.len(), 2);
    assert_eq!(cctv1[0].url(), "http://m.test/cctv1-hd");
    assert_eq!(cctv1[0].resolution, Some(Resolution::new(1920, 1080)));
    assert_eq!(cctv1[0].origin, Origin::Mirror(2));
    assert!(cctv1[0].observed_date.is_none());
    assert_eq!(cctv1[1].url(), "http://m.test/cctv1");
    assert!(cctv1[1].resolution.is_none());

    assert_eq!(resolved["湖南卫视"][0].url(), "http://m.test/hunan");
    assert!(!resolved.contains_key("CCTV5"));
}

/// Matches from several mirrors are concatenated in mirror order
#[tokio::test]
async fn test_mirrors_concatenate_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("CCTV1,http://a.test/1\n"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("cctv-1,http://b.test/1\n"))
        .mount(&mock_server)
        .await;

    let resolver = MirrorResolver::new(
        vec![
            format!("{}/a.txt", mock_server.uri()),
            format!("{}/b.txt", mock_server.uri()),
        ],
        Duration::from_secs(5),
    )
    .unwrap();

    let resolved = resolver.resolve(&["CCTV1".to_string()]).await;
    let urls: Vec<&str> = resolved["CCTV1"].iter().map(|c| c.url()).collect();
    assert_eq!(urls, vec!["http://a.test/1", "http://b.test/1"]);
    assert_eq!(resolved["CCTV1"][1].origin, Origin::Mirror(1));
}

/// No mirrors configured means no extra candidates
#[tokio::test]
async fn test_no_mirrors() {
    let resolver = MirrorResolver::new(Vec::new(), Duration::from_secs(1)).unwrap();
    assert!(resolver.resolve(&["CCTV1".to_string()]).await.is_empty());
}
