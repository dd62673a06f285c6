//! Markdown report generation
//!
//! This module generates a human-readable markdown report for one stored
//! URL: its status, page metrics and the broken links of its latest crawl.

use crate::storage::UrlRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a record to a file
///
/// # Arguments
///
/// * `record` - The stored URL, broken-link details included
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(std::io::Error)` - Failed to write the report
pub fn write_markdown_report(record: &UrlRecord, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_report(record);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a stored URL as a markdown report
pub fn format_markdown_report(record: &UrlRecord) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Page Report: {}\n\n", record.url));

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **ID**: {}\n", record.id));
    md.push_str(&format!("- **Status**: {}\n", record.status));
    md.push_str(&format!(
        "- **Title**: {}\n",
        record.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("-")
    ));
    md.push_str(&format!(
        "- **HTML Version**: {}\n",
        record.html_version.as_deref().unwrap_or("-")
    ));
    md.push_str(&format!("- **Added**: {}\n", record.created_at));
    md.push_str(&format!("- **Updated**: {}\n\n", record.updated_at));

    if !record.status.is_done() {
        md.push_str("_This URL has no completed crawl with the current status._\n\n");
    }

    md.push_str("## Headings\n\n");
    md.push_str("| Level | Count |\n");
    md.push_str("|-------|-------|\n");
    for (level, count) in record.heading_counts().iter().enumerate() {
        md.push_str(&format!("| h{} | {} |\n", level + 1, count));
    }
    md.push('\n');

    md.push_str("## Links\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    md.push_str(&format!("| Internal | {} |\n", record.internal_links));
    md.push_str(&format!("| External | {} |\n", record.external_links));
    md.push_str(&format!("| Broken | {} |\n\n", record.broken_links));

    md.push_str(&format!(
        "- **Login Form**: {}\n\n",
        if record.login_form_found { "yes" } else { "no" }
    ));

    if !record.broken_link_details.is_empty() {
        md.push_str("## Broken Links\n\n");
        md.push_str("| Link | Status |\n");
        md.push_str("|------|--------|\n");
        for broken in &record.broken_link_details {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&broken.link),
                escape_cell(&broken.status)
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps pipes inside a table cell from splitting the row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
