//! Integration tests for Page-Sentry
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! link verifier, the crawl orchestrator and persistence end-to-end.

mod crawl_tests;
mod verifier_tests;

use page_sentry::config::Config;

/// Creates a test configuration with the given pool size and link timeout
pub fn create_test_config(workers: u32, link_timeout_secs: u64) -> Config {
    let mut config = Config::default();
    config.crawler.workers = workers;
    config.crawler.link_timeout_secs = link_timeout_secs;
    config.crawler.page_timeout_secs = 10;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}
