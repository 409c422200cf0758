//! Console ranking of the most frequent words.

use crate::models::WordCounts;
use std::fmt::Write;

/// Widest bar drawn for the most frequent word.
const BAR_WIDTH: u64 = 40;

/// Render the `n` most frequent words, optionally with proportional bars.
///
/// ```text
/// Top words:
/// ------------------------------
/// climate: 5
/// economy: 5
/// news: 1
/// ```
pub fn render_top(counts: &WordCounts, n: usize, bars: bool) -> String {
    let mut out = String::new();
    writeln!(out, "\nTop words:").unwrap();
    writeln!(out, "{}", "-".repeat(30)).unwrap();

    let top = counts.top(n);
    if top.is_empty() {
        writeln!(out, "(no words counted)").unwrap();
        return out;
    }

    if !bars {
        for (word, count) in top {
            writeln!(out, "{word}: {count}").unwrap();
        }
        return out;
    }

    let max = top.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let word_width = top.iter().map(|(w, _)| w.chars().count()).max().unwrap_or(0);
    let count_width = max.to_string().len();
    for (word, count) in top {
        let bar = if max == 0 {
            String::new()
        } else {
            let len = u128::from(count) * u128::from(BAR_WIDTH) / u128::from(max);
            "#".repeat(len.max(1) as usize)
        };
        writeln!(out, "{word:<word_width$}  {count:>count_width$}  {bar}").unwrap();
    }
    out
}
