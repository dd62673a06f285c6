//! Output module for presenting stored URLs and crawl outcomes
//!
//! This module handles:
//! - Plain-text tables for listings, single records and one-shot checks
//! - JSON rendering of any serializable result
//! - Markdown reports for a single record

mod markdown;

pub use markdown::{format_markdown_report, write_markdown_report};

use crate::crawler::CrawlOutcome;
use crate::storage::{UrlPage, UrlRecord};
use serde::Serialize;

/// Renders a value as pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Formats one page of a listing as a table
pub fn format_page_table(page: &UrlPage) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>5}  {:<40}  {:<24}  {:>5}  {:>5}  {:>6}\n",
        "ID", "URL", "STATUS", "INT", "EXT", "BROKEN"
    ));

    for record in &page.urls {
        out.push_str(&format!(
            "{:>5}  {:<40}  {:<24}  {:>5}  {:>5}  {:>6}\n",
            record.id,
            truncate(&record.url, 40),
            truncate(record.status.to_db_string(), 24),
            record.internal_links,
            record.external_links,
            record.broken_links
        ));
    }

    let pages = if page.page_size == 0 {
        0
    } else {
        let size = u64::from(page.page_size);
        (page.total_count + size - 1) / size
    };
    out.push_str(&format!(
        "\nPage {} of {} ({} URL(s) total)\n",
        page.page,
        pages.max(1),
        page.total_count
    ));

    out
}

/// Formats a single stored URL with its broken links
pub fn format_record_table(record: &UrlRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("ID:             {}\n", record.id));
    out.push_str(&format!("URL:            {}\n", record.url));
    out.push_str(&format!("Status:         {}\n", record.status));
    out.push_str(&format!(
        "Title:          {}\n",
        record.title.as_deref().unwrap_or("")
    ));
    out.push_str(&format!(
        "HTML version:   {}\n",
        record.html_version.as_deref().unwrap_or("")
    ));

    let headings: Vec<String> = record
        .heading_counts()
        .iter()
        .enumerate()
        .map(|(level, count)| format!("h{}={}", level + 1, count))
        .collect();
    out.push_str(&format!("Headings:       {}\n", headings.join(" ")));
    out.push_str(&format!("Internal links: {}\n", record.internal_links));
    out.push_str(&format!("External links: {}\n", record.external_links));
    out.push_str(&format!("Broken links:   {}\n", record.broken_links));
    out.push_str(&format!(
        "Login form:     {}\n",
        if record.login_form_found { "yes" } else { "no" }
    ));
    out.push_str(&format!("Added:          {}\n", record.created_at));
    out.push_str(&format!("Updated:        {}\n", record.updated_at));

    for broken in &record.broken_link_details {
        out.push_str(&format!("  ✗ {} ({})\n", broken.link, broken.status));
    }

    out
}

/// Formats the outcome of a one-shot check
pub fn format_outcome_table(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    out.push_str(&format!("Target:         {}\n", outcome.target));
    out.push_str(&format!("Status:         {}\n", outcome.state));

    if let Some(metrics) = &outcome.metrics {
        out.push_str(&format!("Title:          {}\n", metrics.title));
        out.push_str(&format!("HTML version:   {}\n", metrics.html_version));

        let headings: Vec<String> = (1..=6u8)
            .filter_map(|level| {
                metrics
                    .heading_count(level)
                    .map(|count| format!("h{}={}", level, count))
            })
            .collect();
        out.push_str(&format!("Headings:       {}\n", headings.join(" ")));
        out.push_str(&format!("Internal links: {}\n", metrics.internal_links));
        out.push_str(&format!("External links: {}\n", metrics.external_links));
        out.push_str(&format!(
            "Login form:     {}\n",
            if metrics.login_form_found { "yes" } else { "no" }
        ));
        out.push_str(&format!(
            "Links checked:  {} ({} broken)\n",
            outcome.links_found,
            outcome.broken_links.len()
        ));
    }

    for broken in &outcome.broken_links {
        out.push_str(&format!("  ✗ {} ({})\n", broken.url, broken.status));
    }

    out
}

/// Shortens text to at most `max` characters, marking the cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}
