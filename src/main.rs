//! # News Word Tracker
//!
//! Fetches a list of news front pages, extracts their readable text, and
//! tallies word frequencies into a JSON file per source label and day.
//!
//! ## Usage
//!
//! ```sh
//! news_word_tracker --top 20 --bars
//! news_word_tracker --config tracker.yaml --strategy dynamic
//! ```
//!
//! ## Architecture
//!
//! A single sequential pass over the configured URLs:
//! 1. **Fetching**: static HTTP GET, or headless Chromium with bounded scrolling
//! 2. **Extraction**: drop boilerplate, keep the main content regions
//! 3. **Counting**: tokenize, filter stop words and noise, count
//! 4. **Aggregation**: fold every URL's counts into the run total
//! 5. **Output**: persist to `data/<source>_<stamp>.json` and print the top words

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod extract;
mod fetchers;
mod models;
mod outputs;
mod pipeline;
mod stopwords;
mod tokenize;
mod utils;

use cli::Cli;
use config::{FetchStrategy, TrackerConfig};
use extract::Extractor;
use fetchers::http::HttpFetcher;
use models::{RunSummary, UrlStatus};
use outputs::{json, report};
use pipeline::Tracker;
use tokenize::Tokenizer;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("news_word_tracker starting up");

    // --- Configuration ---
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path).await?,
        None => TrackerConfig::default(),
    };
    config.apply_cli(&args);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e);
    }
    info!(
        urls = config.urls.len(),
        source = %config.source,
        strategy = ?config.strategy,
        persist = ?config.persist,
        "Configuration resolved"
    );

    // Idempotent setup before any fetching
    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let stop_words = config.stop_words();
    debug!(stop_words = stop_words.len(), "Stop-word set built");
    let tracker = Tracker::new(
        Extractor::new(&config.extract)?,
        Tokenizer::new(config.tokenizer.clone(), stop_words),
    );

    // --- Run ---
    let summary = match config.strategy {
        FetchStrategy::Static => {
            let fetcher = HttpFetcher::new(&config.fetch)?;
            tracker.run(&fetcher, &config.urls).await
        }
        FetchStrategy::Dynamic => run_dynamic(&tracker, &config).await?,
    };

    for url_report in &summary.reports {
        if let UrlStatus::Failed { reason } = &url_report.status {
            warn!(url = %url_report.url, %reason, "Skipped URL");
        }
    }

    // --- Output ---
    if summary.totals.is_empty() {
        warn!("No words were processed. Check if the website content was properly accessed.");
    } else {
        let now = Local::now().naive_local();
        match json::write_counts(&summary.totals, &config.data_dir, &config.source, config.persist, now).await {
            Ok(path) => info!(path = %path.display(), "Saved word counts"),
            Err(e) => {
                error!(error = %e, "Failed to save word counts");
                return Err(e);
            }
        }
    }

    print!("{}", report::render_top(&summary.totals, config.top, config.bars));

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        counted = summary.counted(),
        empty = summary.empty(),
        failed = summary.failed(),
        "Execution complete"
    );

    Ok(())
}

/// Run the pipeline through headless Chromium, releasing the browser
/// afterwards no matter how the run went.
#[cfg(feature = "browser")]
async fn run_dynamic(tracker: &Tracker, config: &TrackerConfig) -> Result<RunSummary, Box<dyn Error>> {
    use fetchers::browser::BrowserFetcher;

    let browser = BrowserFetcher::launch(&config.scroll).await?;
    let summary = tracker.run(&browser, &config.urls).await;
    browser.close().await;
    Ok(summary)
}

#[cfg(not(feature = "browser"))]
async fn run_dynamic(_tracker: &Tracker, _config: &TrackerConfig) -> Result<RunSummary, Box<dyn Error>> {
    Err("the dynamic strategy needs a build with `--features browser`".into())
}

#[cfg(all(test, not(feature = "browser")))]
mod tests {
    use super::*;
    use crate::extract::ExtractSettings;
    use crate::stopwords::StopWords;
    use crate::tokenize::TokenizerSettings;

    #[tokio::test]
    async fn test_dynamic_strategy_needs_browser_feature() {
        let config = TrackerConfig {
            strategy: FetchStrategy::Dynamic,
            ..TrackerConfig::default()
        };
        let tracker = Tracker::new(
            Extractor::new(&ExtractSettings::default()).unwrap(),
            Tokenizer::new(TokenizerSettings::default(), StopWords::english()),
        );

        let err = run_dynamic(&tracker, &config).await.unwrap_err();
        assert!(err.to_string().contains("--features browser"));
    }
}
