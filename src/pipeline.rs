//! The per-run pipeline: fetch → extract → tokenize → aggregate.
//!
//! URLs are processed strictly one after another. A failing URL is logged,
//! recorded as [`UrlStatus::Failed`] and contributes nothing; the run always
//! moves on to the next URL and never retries.

use crate::extract::Extractor;
use crate::fetchers::{FetchError, PageFetcher};
use crate::models::{PageContent, RunSummary, UrlReport, UrlStatus, WordCounts};
use crate::tokenize::Tokenizer;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

/// Extraction and counting configuration for one run.
#[derive(Debug)]
pub struct Tracker {
    extractor: Extractor,
    tokenizer: Tokenizer,
}

impl Tracker {
    pub fn new(extractor: Extractor, tokenizer: Tokenizer) -> Self {
        Self {
            extractor,
            tokenizer,
        }
    }

    /// Process every URL in order and fold the per-URL tables into one total.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Static or browser-backed page source
    /// * `urls` - Pages to process, in order
    ///
    /// # Returns
    ///
    /// A [`RunSummary`] with the merged totals and one [`UrlReport`] per URL.
    /// Failures are recorded in the reports rather than returned, so a run
    /// always covers every URL.
    #[instrument(level = "info", skip_all, fields(urls = urls.len()))]
    pub async fn run<F: PageFetcher>(&self, fetcher: &F, urls: &[String]) -> RunSummary {
        let results: Vec<(UrlReport, Option<WordCounts>)> = stream::iter(urls)
            .then(move |url| async move {
                info!("Processing: {url}");
                match self.process_url(fetcher, url).await {
                    Ok(counts) if counts.is_empty() => {
                        warn!(%url, "No countable words found");
                        (report(url, UrlStatus::NoContent), None)
                    }
                    Ok(counts) => {
                        let status = UrlStatus::Counted {
                            tokens: counts.total(),
                            distinct: counts.len(),
                        };
                        info!(%url, tokens = counts.total(), distinct = counts.len(), "Counted words");
                        (report(url, status), Some(counts))
                    }
                    Err(e) => {
                        error!(%url, error = %e, "Error fetching page");
                        let status = UrlStatus::Failed {
                            reason: e.to_string(),
                        };
                        (report(url, status), None)
                    }
                }
            })
            .collect()
            .await;

        let mut summary = RunSummary::default();
        for (url_report, counts) in results {
            if let Some(counts) = counts {
                summary.totals.merge(&counts);
            }
            summary.reports.push(url_report);
        }

        info!(
            counted = summary.counted(),
            empty = summary.empty(),
            failed = summary.failed(),
            distinct = summary.totals.len(),
            "Run complete"
        );
        summary
    }

    /// Fetch one URL and count its words.
    ///
    /// An `Ok` with an empty table means the page was reachable but had no
    /// countable text; `Err` means the page could not be fetched at all.
    pub async fn process_url<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &str,
    ) -> Result<WordCounts, FetchError> {
        let text = match fetcher.fetch(url).await? {
            PageContent::Html(html) => self.extractor.extract(&html),
            PageContent::Text(text) => text,
        };
        debug!(%url, chars = text.len(), preview = %truncate_for_log(&text, 120), "Extracted text");
        Ok(self.tokenizer.count(&text))
    }
}

fn report(url: &str, status: UrlStatus) -> UrlReport {
    UrlReport {
        url: url.to_string(),
        status,
    }
}
