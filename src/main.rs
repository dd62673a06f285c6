//! Page-Sentry main entry point
//!
//! This is the command-line interface for storing pages, crawling them and
//! reporting their structure and broken links.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use page_sentry::config::{load_config, Config};
use page_sentry::crawler::{run_crawl, Crawler};
use page_sentry::output::{
    format_markdown_report, format_outcome_table, format_page_table, format_record_table,
    to_json, write_markdown_report,
};
use page_sentry::storage::{
    insert_or_get_url, open_storage, ListQuery, SortField, SortOrder, Storage,
};
use page_sentry::{parse_target, SentryError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Page-Sentry: page structure analysis and broken link detection
///
/// Page-Sentry fetches a page, reports its title, HTML version, heading
/// counts, internal/external link split and login form presence, and checks
/// every outgoing link concurrently.
#[derive(Parser, Debug)]
#[command(name = "page-sentry")]
#[command(version)]
#[command(about = "Page structure analysis and broken link detection", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a URL for crawling
    Add {
        /// Absolute http or https URL
        url: String,
    },

    /// List stored URLs
    List {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Records per page (1-100)
        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// Column to sort on
        #[arg(long, default_value = "created_at")]
        sort_by: SortField,

        /// Sort direction: asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one stored URL with its broken links
    Show {
        id: i64,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Write the rendered markdown report to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Crawl a stored URL and save the results
    Crawl {
        id: i64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a stored URL and its broken links
    Delete { id: i64 },

    /// Crawl a URL once without storing anything
    Check {
        url: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Add { url } => handle_add(&config, &url),
        Command::List {
            page,
            page_size,
            sort_by,
            order,
            json,
        } => handle_list(&config, ListQuery::new(page, page_size, sort_by, order), json),
        Command::Show { id, format, output } => {
            handle_show(&config, id, format, output.as_deref())
        }
        Command::Crawl { id, json } => handle_crawl(&config, id, json).await,
        Command::Delete { id } => handle_delete(&config, id),
        Command::Check { url, json } => handle_check(&config, &url, json).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_sentry=info,warn"),
            1 => EnvFilter::new("page_sentry=debug,info"),
            2 => EnvFilter::new("page_sentry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<page_sentry::storage::SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("failed to open database {}", path.display()))
}

/// Handles `add`: validates and stores a URL as pending
fn handle_add(config: &Config, url: &str) -> anyhow::Result<ExitCode> {
    let target = parse_target(url)?;
    let mut storage = open_database(config)?;

    let (id, created) = insert_or_get_url(&mut storage, target.as_str())?;
    if created {
        tracing::info!("Stored {} with id {}", target, id);
    } else {
        tracing::info!("{} is already stored with id {}", target, id);
    }
    println!("{}\t{}", id, target);

    Ok(ExitCode::SUCCESS)
}

/// Handles `list`: prints one page of stored URLs
fn handle_list(config: &Config, query: ListQuery, json: bool) -> anyhow::Result<ExitCode> {
    let storage = open_database(config)?;
    let page = storage.list_urls(&query)?;

    if json {
        println!("{}", to_json(&page)?);
    } else {
        print!("{}", format_page_table(&page));
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles `show`: prints one stored URL in the requested format
fn handle_show(
    config: &Config,
    id: i64,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let storage = open_database(config)?;
    let record = storage.get_url(id).map_err(|e| match e {
        page_sentry::storage::StorageError::UrlNotFound(_) => SentryError::NotFound { id },
        other => other.into(),
    })?;

    match (format, output) {
        (Format::Markdown, Some(path)) => {
            write_markdown_report(&record, path)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("✓ Report written to: {}", path.display());
        }
        (Format::Markdown, None) => print!("{}", format_markdown_report(&record)),
        (Format::Json, _) => println!("{}", to_json(&record)?),
        (Format::Table, _) => print!("{}", format_record_table(&record)),
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles `crawl`: crawls a stored URL and prints the refreshed record
async fn handle_crawl(config: &Config, id: i64, json: bool) -> anyhow::Result<ExitCode> {
    let mut storage = open_database(config)?;
    let crawler = Crawler::new(config)?;

    match run_crawl(&mut storage, &crawler, id).await {
        Ok(record) => {
            if json {
                println!("{}", to_json(&record)?);
            } else {
                print!("{}", format_record_table(&record));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(SentryError::CrawlFailed { url, reason }) => {
            tracing::error!("Crawl of {} failed: {}", url, reason);
            eprintln!("✗ {}: {}", url, reason);
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

/// Handles `delete`: removes a stored URL
fn handle_delete(config: &Config, id: i64) -> anyhow::Result<ExitCode> {
    let mut storage = open_database(config)?;
    storage.delete_url(id).map_err(|e| match e {
        page_sentry::storage::StorageError::UrlNotFound(_) => SentryError::NotFound { id },
        other => other.into(),
    })?;

    println!("✓ Deleted URL {}", id);
    Ok(ExitCode::SUCCESS)
}

/// Handles `check`: one-shot crawl without persistence
///
/// Exit code 0 when every link passed, 1 when broken links were found and
/// 2 when the page itself could not be crawled.
async fn handle_check(config: &Config, url: &str, json: bool) -> anyhow::Result<ExitCode> {
    let target = parse_target(url)?;
    let crawler = Crawler::new(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning link verification");
            on_interrupt.cancel();
        }
    });

    let outcome = crawler.crawl_with_cancel(&target, cancel).await;

    if json {
        println!("{}", to_json(&outcome)?);
    } else {
        print!("{}", format_outcome_table(&outcome));
    }

    let code = if !outcome.is_done() {
        2
    } else if !outcome.broken_links.is_empty() {
        1
    } else {
        0
    };

    Ok(ExitCode::from(code))
}
