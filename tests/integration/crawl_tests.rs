//! Crawl orchestration and persistence against mock servers

use crate::create_test_config;
use page_sentry::crawler::{run_crawl, Crawler};
use page_sentry::storage::{SqliteStorage, Storage};
use page_sentry::{CrawlState, SentryError};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(mock_server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(mock_server)
        .await;
}

async fn mount_status(mock_server: &MockServer, link_path: &str, status: u16) {
    Mock::given(path(link_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_crawl_measures_page_and_reports_broken_links() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    // localhost and 127.0.0.1 are different authorities on the same server
    mount_page(
        &mock_server,
        "/",
        format!(
            r##"<html><head><title> Hi </title></head><body>
            <h1>A</h1><h1>B</h1><h2>C</h2>
            <a href="/x">x</a>
            <a href="/missing">missing</a>
            <a href="http://localhost:{}/ext">ext</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="#top">top</a>
            <a href="">empty</a>
            </body></html>"##,
            port
        ),
    )
    .await;
    mount_status(&mock_server, "/x", 200).await;
    mount_status(&mock_server, "/missing", 404).await;
    mount_status(&mock_server, "/ext", 200).await;

    let crawler = Crawler::new(&create_test_config(10, 5)).expect("Failed to build crawler");
    let target = Url::parse(&format!("{}/", mock_server.uri())).unwrap();

    let outcome = crawler.crawl(&target).await;

    assert_eq!(outcome.state, CrawlState::Done);
    let metrics = outcome.metrics.expect("Done crawl must carry metrics");
    assert_eq!(metrics.title, "Hi");
    assert_eq!(metrics.html_version, "HTML5");
    assert_eq!(metrics.h1_count, 2);
    assert_eq!(metrics.h2_count, 1);
    assert_eq!(metrics.h3_count, 0);
    assert_eq!(metrics.internal_links, 2);
    assert_eq!(metrics.external_links, 2);
    assert!(!metrics.login_form_found);

    assert_eq!(outcome.links_found, 3);
    let missing = format!("{}/missing", mock_server.uri());
    let broken = outcome
        .broken_links
        .iter()
        .find(|link| link.url == missing)
        .expect("Missing link should be reported");
    assert!(broken.status.contains("404"));
    assert!(outcome
        .broken_links
        .iter()
        .all(|link| link.url != format!("{}/x", mock_server.uri())));
}

#[tokio::test]
async fn test_crawl_detects_login_form() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/login",
        r#"<!DOCTYPE html><html><body>
        <form action="/session"><input name="user"><input type="PASSWORD" name="pw"></form>
        </body></html>"#
            .to_string(),
    )
    .await;

    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();
    let target = Url::parse(&format!("{}/login", mock_server.uri())).unwrap();

    let outcome = crawler.crawl(&target).await;

    let metrics = outcome.metrics.expect("Done crawl must carry metrics");
    assert!(metrics.login_form_found);
    assert_eq!(outcome.links_found, 0);
    assert!(outcome.broken_links.is_empty());
}

#[tokio::test]
async fn test_doctype_sniffing_when_enabled() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/legacy",
        r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN" "http://www.w3.org/TR/html4/loose.dtd">
        <html><head><title>Old</title></head><body></body></html>"#
            .to_string(),
    )
    .await;

    let mut config = create_test_config(10, 5);
    config.crawler.sniff_doctype = true;
    let crawler = Crawler::new(&config).unwrap();
    let target = Url::parse(&format!("{}/legacy", mock_server.uri())).unwrap();

    let outcome = crawler.crawl(&target).await;

    let metrics = outcome.metrics.expect("Done crawl must carry metrics");
    assert_eq!(metrics.html_version, "HTML 4.01 Transitional");
}

#[tokio::test]
async fn test_relative_links_resolve_against_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/docs/", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/docs/",
        r#"<html><body><a href="guide">guide</a></body></html>"#.to_string(),
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/docs/guide"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();
    let target = Url::parse(&format!("{}/old", mock_server.uri())).unwrap();

    let outcome = crawler.crawl(&target).await;

    assert!(outcome.is_done());
    assert_eq!(outcome.links_found, 1);
    assert!(outcome.broken_links.is_empty());
}

#[tokio::test]
async fn test_page_500_fails_without_metrics() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();
    let target = Url::parse(&format!("{}/", mock_server.uri())).unwrap();

    let outcome = crawler.crawl(&target).await;

    assert_eq!(outcome.state, CrawlState::failed_with_status(500));
    assert_eq!(outcome.state.to_db_string(), "failed with status 500");
    assert!(outcome.metrics.is_none());
    assert!(outcome.broken_links.is_empty());
}

#[tokio::test]
async fn test_run_crawl_replaces_broken_links() {
    let mock_server = MockServer::start().await;
    let target = format!("{}/", mock_server.uri());

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/a">a</a><a href="/b">b</a></body></html>"#.to_string(),
    )
    .await;
    mount_status(&mock_server, "/a", 404).await;
    mount_status(&mock_server, "/b", 410).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();
    let id = storage.insert_url(&target).unwrap();

    let record = run_crawl(&mut storage, &crawler, id)
        .await
        .expect("First crawl should succeed");
    assert_eq!(record.status, CrawlState::Done);
    assert_eq!(record.broken_links, 2);
    assert_eq!(record.internal_links, 2);

    // Page changes: /a is fixed, /c is new and broken
    mock_server.reset().await;
    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/a">a</a><a href="/c">c</a></body></html>"#.to_string(),
    )
    .await;
    mount_status(&mock_server, "/a", 200).await;
    mount_status(&mock_server, "/c", 500).await;

    let record = run_crawl(&mut storage, &crawler, id)
        .await
        .expect("Second crawl should succeed");

    assert_eq!(record.broken_links, 1);
    assert_eq!(record.broken_link_details.len(), 1);
    assert_eq!(
        record.broken_link_details[0].link,
        format!("{}/c", mock_server.uri())
    );
    assert_eq!(
        record.broken_link_details[0].status,
        "500 Internal Server Error"
    );
}

#[tokio::test]
async fn test_run_crawl_failure_keeps_previous_results() {
    let mock_server = MockServer::start().await;
    let target = format!("{}/", mock_server.uri());

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Before</title></head><body><a href="/a">a</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_status(&mock_server, "/a", 404).await;

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();
    let id = storage.insert_url(&target).unwrap();

    run_crawl(&mut storage, &crawler, id).await.unwrap();

    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = run_crawl(&mut storage, &crawler, id).await;
    match result {
        Err(SentryError::CrawlFailed { url, reason }) => {
            assert_eq!(url, target);
            assert_eq!(reason, "failed with status 503");
        }
        other => panic!("Expected CrawlFailed, got {:?}", other),
    }

    let record = storage.get_url(id).unwrap();
    assert_eq!(record.status.to_db_string(), "failed with status 503");
    assert_eq!(record.title.as_deref(), Some("Before"));
    assert_eq!(record.broken_link_details.len(), 1);
}

#[tokio::test]
async fn test_run_crawl_on_disk_database() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Disk</title></head><body></body></html>"#.to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sentry.db");
    let crawler = Crawler::new(&create_test_config(10, 5)).unwrap();

    let id = {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        let id = storage
            .insert_url(&format!("{}/", mock_server.uri()))
            .unwrap();
        run_crawl(&mut storage, &crawler, id).await.unwrap();
        id
    };

    // Reopen to make sure the outcome was committed
    let storage = SqliteStorage::new(&db_path).unwrap();
    let record = storage.get_url(id).unwrap();
    assert_eq!(record.status, CrawlState::Done);
    assert_eq!(record.title.as_deref(), Some("Disk"));
}
