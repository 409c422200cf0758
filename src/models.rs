//! Data models shared across the fetch → extract → count pipeline.
//!
//! - [`WordCounts`]: a token frequency table, serialized as a flat JSON object
//! - [`PageContent`]: what a fetcher hands back for one URL
//! - [`UrlReport`] / [`UrlStatus`]: the per-URL outcome of a run
//! - [`RunSummary`]: aggregated totals plus every per-URL outcome

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A merge would push the count of this token past `u64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("count for {0:?} would overflow")]
pub struct CountOverflow(pub String);

/// A mapping from normalized token to occurrence count.
///
/// Backed by a `BTreeMap` so the persisted JSON has a stable key order.
/// Ordering carries no meaning beyond that; ranking is done by [`WordCounts::top`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordCounts(BTreeMap<String, u64>);

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` occurrences of `token`. Absent keys start at `n`; counts
    /// saturate at `u64::MAX`.
    pub fn add(&mut self, token: impl Into<String>, n: u64) {
        let slot = self.0.entry(token.into()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Fold another table into this one by adding counts key-wise.
    ///
    /// Saturating addition keeps this commutative and associative, so the
    /// order in which per-URL tables arrive never changes the total.
    pub fn merge(&mut self, other: &WordCounts) {
        for (token, count) in &other.0 {
            self.add(token.as_str(), *count);
        }
    }

    /// Like [`WordCounts::merge`], but refuses to fold if any count would
    /// overflow. On error `self` is unchanged.
    pub fn try_merge(&mut self, other: &WordCounts) -> Result<(), CountOverflow> {
        for (token, count) in &other.0 {
            if self.get(token).unwrap_or(0).checked_add(*count).is_none() {
                return Err(CountOverflow(token.clone()));
            }
        }
        self.merge(other);
        Ok(())
    }

    pub fn get(&self, token: &str) -> Option<u64> {
        self.0.get(token).copied()
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().fold(0, |acc, c| acc.saturating_add(*c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The `n` most frequent tokens, count descending.
    ///
    /// Equal counts are ordered by token ascending so rankings are
    /// reproducible between runs.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        self.iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(n)
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for WordCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = WordCounts::new();
        for (token, n) in iter {
            counts.add(token, n);
        }
        counts
    }
}

/// Raw content returned by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// Static HTML that still needs boilerplate removal and text extraction.
    Html(String),
    /// Text already rendered and collected by the headless browser.
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    Text(String),
}

/// Outcome of processing a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStatus {
    /// Content was fetched and at least one token survived filtering.
    Counted { tokens: u64, distinct: usize },
    /// The fetch succeeded but nothing countable was found.
    NoContent,
    /// The fetch failed; the URL contributed nothing.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReport {
    pub url: String,
    pub status: UrlStatus,
}

/// Everything a single run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Running total across all processed URLs.
    pub totals: WordCounts,
    /// One entry per input URL, in processing order.
    pub reports: Vec<UrlReport>,
}

impl RunSummary {
    pub fn counted(&self) -> usize {
        self.count_where(|s| matches!(s, UrlStatus::Counted { .. }))
    }

    pub fn empty(&self) -> usize {
        self.count_where(|s| matches!(s, UrlStatus::NoContent))
    }

    pub fn failed(&self) -> usize {
        self.count_where(|s| matches!(s, UrlStatus::Failed { .. }))
    }

    fn count_where(&self, pred: impl Fn(&UrlStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }
}
