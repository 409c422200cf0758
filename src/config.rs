//! Run configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults ([`TrackerConfig::default`])
//! 2. the YAML file passed with `--config`
//! 3. command-line flags / environment variables
//!
//! The resolved config is validated once and then passed explicitly into the
//! pipeline; nothing is read from global state during a run.
//!
//! # Example
//!
//! ```yaml
//! source: news
//! data_dir: data
//! strategy: dynamic
//! persist: snapshot
//! top: 10
//! extra_stop_words: [reuters, subscribe]
//! urls:
//!   - https://www.bbc.com/
//! extract:
//!   mode: structured
//! tokenizer:
//!   split: whitespace
//!   min_len: 0
//! scroll:
//!   max_scrolls: 10
//! ```

use crate::cli::Cli;
use crate::extract::ExtractSettings;
use crate::fetchers::browser::ScrollSettings;
use crate::fetchers::http::FetchSettings;
use crate::outputs::json::PersistMode;
use crate::stopwords::StopWords;
use crate::tokenize::TokenizerSettings;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

/// News front pages processed when no URLs are configured.
pub const DEFAULT_URLS: &[&str] = &[
    "https://www.nytimes.com/",
    "https://www.wsj.com/",
    "https://news.ycombinator.com/",
    "https://www.cnn.com/",
    "https://www.bbc.com/",
    "https://www.reuters.com/",
    "https://www.theguardian.com/",
    "https://www.aljazeera.com/",
    "https://www.npr.org/",
    "https://www.bloomberg.com/",
    "https://www.economist.com/",
    "https://www.ft.com/",
    "https://www.nbcnews.com/",
    "https://www.usatoday.com/",
    "https://www.latimes.com/",
    "https://www.chicagotribune.com/",
    "https://www.foxnews.com/",
    "https://www.huffpost.com/",
    "https://www.politico.com/",
    "https://www.apnews.com/",
    "https://www.axios.com/",
    "https://www.buzzfeednews.com/",
    "https://www.vice.com/",
    "https://www.msnbc.com/",
    "https://www.bbc.co.uk/news",
    "https://www.thetimes.co.uk/",
    "https://www.telegraph.co.uk/",
    "https://www.independent.co.uk/",
    "https://www.mirror.co.uk/",
    "https://www.express.co.uk/",
    "https://www.dailymail.co.uk/",
    "https://www.thesun.co.uk/",
];

/// How page content is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// One HTTP GET per URL; HTML is parsed locally.
    #[default]
    Static,
    /// Headless Chromium with scrolling; needs the `browser` feature.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub urls: Vec<String>,
    /// Label used to name output files.
    pub source: String,
    pub data_dir: PathBuf,
    pub strategy: FetchStrategy,
    pub persist: PersistMode,
    /// Length of the final ranking.
    pub top: usize,
    pub bars: bool,
    /// Include the built-in English list (plus news extras).
    pub builtin_stop_words: bool,
    pub extra_stop_words: Vec<String>,
    pub fetch: FetchSettings,
    pub scroll: ScrollSettings,
    pub extract: ExtractSettings,
    pub tokenizer: TokenizerSettings,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            urls: DEFAULT_URLS.iter().map(|u| u.to_string()).collect(),
            source: "news_tracker".to_string(),
            data_dir: PathBuf::from("data"),
            strategy: FetchStrategy::Static,
            persist: PersistMode::Merge,
            top: 50,
            bars: false,
            builtin_stop_words: true,
            extra_stop_words: Vec::new(),
            fetch: FetchSettings::default(),
            scroll: ScrollSettings::default(),
            extract: ExtractSettings::default(),
            tokenizer: TokenizerSettings::default(),
        }
    }
}

impl TrackerConfig {
    /// Read a YAML config file. Missing keys take their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        let config = Self::from_yaml(&raw)?;
        debug!(?config, "Loaded config file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overlay whatever the command line set.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(source) = &cli.source {
            self.source = source.clone();
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if let Some(persist) = cli.persist {
            self.persist = persist;
        }
        if let Some(top) = cli.top {
            self.top = top;
        }
        if cli.bars {
            self.bars = true;
        }
        if !cli.urls.is_empty() {
            self.urls = cli.urls.clone();
        }
    }

    /// Reject configurations that could only fail later.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.urls.is_empty() {
            return Err("no URLs configured".into());
        }
        for url in &self.urls {
            let parsed = Url::parse(url).map_err(|e| format!("invalid URL {url:?}: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("unsupported URL scheme in {url:?}").into());
            }
        }
        if self.source.trim().is_empty() {
            return Err("source label must not be empty".into());
        }
        if self.source.contains(['/', '\\']) || self.source.contains("..") {
            return Err(format!("source label {:?} must not contain path separators", self.source).into());
        }
        if self.top == 0 {
            return Err("top must be at least 1".into());
        }
        Ok(())
    }

    /// The stop-word set this config describes.
    pub fn stop_words(&self) -> StopWords {
        let base = if self.builtin_stop_words {
            StopWords::english()
        } else {
            StopWords::empty()
        };
        base.with_extra(&self.extra_stop_words)
    }
}
