//! Command-line interface definitions for the news word tracker.
//!
//! Every option is optional: anything left unset falls back to the config
//! file (if given) and then to the built-in defaults. Options can also be set
//! through environment variables.

use crate::config::FetchStrategy;
use crate::outputs::json::PersistMode;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in URL list, static fetching, merge into today's file
/// news_word_tracker
///
/// # Render pages in headless Chromium and show bars for the top 20
/// news_word_tracker --strategy dynamic --top 20 --bars
///
/// # Ad-hoc URLs into a separate snapshot file
/// news_word_tracker -u https://text.npr.org -u https://lite.cnn.com --persist snapshot -s lite
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_TRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the JSON count files are written to
    #[arg(short, long, env = "NEWS_TRACKER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Source label used to name output files
    #[arg(short, long, env = "NEWS_TRACKER_SOURCE")]
    pub source: Option<String>,

    /// How pages are fetched
    #[arg(long, value_enum, env = "NEWS_TRACKER_STRATEGY")]
    pub strategy: Option<FetchStrategy>,

    /// Merge into the day's file, or write a new snapshot per run
    #[arg(long, value_enum, env = "NEWS_TRACKER_PERSIST")]
    pub persist: Option<PersistMode>,

    /// Number of words in the final ranking
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Draw proportional bars next to the ranking
    #[arg(long)]
    pub bars: bool,

    /// URL to process (repeatable); replaces the configured list
    #[arg(short = 'u', long = "url")]
    pub urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_are_unset() {
        let cli = Cli::parse_from(["news_word_tracker"]);
        assert!(cli.config.is_none());
        assert!(cli.strategy.is_none());
        assert!(cli.persist.is_none());
        assert!(cli.top.is_none());
        assert!(!cli.bars);
        assert!(cli.urls.is_empty());
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "news_word_tracker",
            "--data-dir",
            "/tmp/data",
            "--source",
            "news",
            "--strategy",
            "dynamic",
            "--persist",
            "snapshot",
            "--top",
            "10",
            "--bars",
        ]);

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        assert_eq!(cli.source.as_deref(), Some("news"));
        assert_eq!(cli.strategy, Some(FetchStrategy::Dynamic));
        assert_eq!(cli.persist, Some(PersistMode::Snapshot));
        assert_eq!(cli.top, Some(10));
        assert!(cli.bars);
    }

    #[test]
    fn test_cli_short_flags_and_repeated_urls() {
        let cli = Cli::parse_from([
            "news_word_tracker",
            "-c",
            "tracker.yaml",
            "-n",
            "5",
            "-u",
            "https://text.npr.org",
            "-u",
            "https://lite.cnn.com",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("tracker.yaml")));
        assert_eq!(cli.top, Some(5));
        assert_eq!(cli.urls, vec!["https://text.npr.org", "https://lite.cnn.com"]);
    }

    #[test]
    fn test_cli_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["news_word_tracker", "--strategy", "carrier-pigeon"]).is_err());
    }
}
