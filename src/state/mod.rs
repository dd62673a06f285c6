//! State module for tracking the lifecycle of a stored URL
//!
//! A stored URL starts as `pending`, moves to `crawling` while the pipeline
//! runs, and ends in one of the terminal crawl states: `done` or a failure
//! descriptor carrying the HTTP status or transport error text.

mod crawl_state;

pub use crawl_state::CrawlState;
