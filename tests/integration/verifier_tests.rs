//! Link verifier behavior against mock servers

use crate::create_test_config;
use page_sentry::crawler::{build_http_client, LinkVerifier};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn verifier(workers: u32, timeout_secs: u64) -> LinkVerifier {
    let config = create_test_config(workers, timeout_secs);
    let client = build_http_client(&config).expect("Failed to build client");
    LinkVerifier::new(
        client,
        config.crawler.workers as usize,
        config.crawler.link_timeout(),
    )
}

#[tokio::test]
async fn test_passing_probe_skips_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!("{}/ok", mock_server.uri());
    let report = verifier(10, 5).verify(vec![url]).await;

    assert!(report.broken.is_empty());
    assert_eq!(report.checked, 1);
}

#[tokio::test]
async fn test_fallback_rescues_failed_probe() {
    let mock_server = MockServer::start().await;

    // HEAD is unmatched, so the mock server answers 404
    Mock::given(method("GET"))
        .and(path("/head-unsupported"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/head-unsupported", mock_server.uri());
    let report = verifier(10, 5).verify(vec![url]).await;

    assert!(
        report.broken.is_empty(),
        "Link rescued by fallback must not be reported: {:?}",
        report.broken
    );
}

#[tokio::test]
async fn test_probe_405_then_fallback_404_reports_fallback_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/gone", mock_server.uri());
    let report = verifier(10, 5).verify(vec![url.clone()]).await;

    assert_eq!(report.broken.len(), 1);
    assert_eq!(report.broken.get(&url).map(String::as_str), Some("404 Not Found"));
}

#[tokio::test]
async fn test_404_on_both_attempts_reported_once() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let report = verifier(10, 5).verify(vec![url.clone()]).await;

    assert_eq!(report.broken.len(), 1);
    let status = report.broken.get(&url).expect("Link should be broken");
    assert!(status.contains("404"), "Unexpected status: {}", status);
}

#[tokio::test]
async fn test_transport_error_reported_with_error_text() {
    let url = "http://127.0.0.1:1/unreachable".to_string();
    let report = verifier(10, 2).verify(vec![url.clone()]).await;

    let status = report.broken.get(&url).expect("Link should be broken");
    assert!(!status.trim().is_empty());
    assert!(!status.contains("Not Found"));
}

#[tokio::test]
async fn test_slow_link_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(4)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow", mock_server.uri());
    let report = verifier(10, 1).verify(vec![url.clone()]).await;

    let status = report.broken.get(&url).expect("Slow link should be broken");
    assert!(status.contains("timed out"), "Unexpected status: {}", status);
}

#[tokio::test]
async fn test_more_workers_than_links_terminates() {
    let mock_server = MockServer::start().await;

    Mock::given(path_regex(r"^/page/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..3)
        .map(|i| format!("{}/page/{}", mock_server.uri(), i))
        .collect();

    let report = verifier(10, 5).verify(urls).await;

    assert!(report.broken.is_empty());
    assert_eq!(report.checked, 3);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn test_more_links_than_workers_reports_exact_subset() {
    let mock_server = MockServer::start().await;

    Mock::given(path_regex(r"^/ok/\d+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(path_regex(r"^/bad/\d+$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut urls = Vec::new();
    let mut expected_broken = Vec::new();
    for i in 0..20 {
        urls.push(format!("{}/ok/{}", mock_server.uri(), i));
    }
    for i in 0..5 {
        let url = format!("{}/bad/{}", mock_server.uri(), i);
        expected_broken.push(url.clone());
        urls.push(url);
    }

    let report = verifier(2, 5).verify(urls.clone()).await;

    assert_eq!(report.checked, 25);
    assert_eq!(report.broken.len(), 5);
    for url in &expected_broken {
        assert_eq!(
            report.broken.get(url).map(String::as_str),
            Some("500 Internal Server Error")
        );
    }
    for url in report.broken.keys() {
        assert!(urls.contains(url), "Reported URL {} was never submitted", url);
    }
}

#[tokio::test]
async fn test_duplicate_urls_checked_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/dup"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dup"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/dup", mock_server.uri());
    let report = verifier(4, 5).verify(vec![url.clone(); 5]).await;

    assert_eq!(report.submitted, 1);
    assert_eq!(report.checked, 1);
    assert_eq!(report.broken.len(), 1);
}

#[tokio::test]
async fn test_cancellation_abandons_in_flight_checks() {
    let mock_server = MockServer::start().await;

    Mock::given(path_regex(r"^/slow/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..4)
        .map(|i| format!("{}/slow/{}", mock_server.uri(), i))
        .collect();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = verifier(1, 10).verify_with_cancel(urls, cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.checked, 0);
    assert!(report.broken.is_empty());
    assert!(started.elapsed() < Duration::from_secs(3));
}
