//! Tokenization and filtering of extracted text into word counts.

use crate::models::WordCounts;
use crate::stopwords::StopWords;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Unicode word boundaries (UAX #29).
    #[default]
    Words,
    /// Plain whitespace splitting.
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerSettings {
    pub split: SplitMode,
    /// Tokens shorter than this many chars are dropped; `0` disables the check.
    pub min_len: usize,
    /// Drop tokens made only of digits.
    pub drop_numeric: bool,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            split: SplitMode::Words,
            min_len: 4,
            drop_numeric: true,
        }
    }
}

/// Turns text into a [`WordCounts`] table.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    settings: TokenizerSettings,
    stop_words: StopWords,
}

impl Tokenizer {
    pub fn new(settings: TokenizerSettings, stop_words: StopWords) -> Self {
        Self {
            settings,
            stop_words,
        }
    }

    /// Count every token in `text` that survives the filter.
    pub fn count(&self, text: &str) -> WordCounts {
        let mut counts = WordCounts::new();
        if text.trim().is_empty() {
            return counts;
        }

        let lowered = text.to_lowercase();
        let raw: Vec<&str> = match self.settings.split {
            SplitMode::Words => lowered.unicode_words().collect(),
            SplitMode::Whitespace => lowered.split_whitespace().collect(),
        };

        for token in raw.into_iter().map(strip_punctuation) {
            if self.keep(token) {
                counts.add(token, 1);
            }
        }
        counts
    }

    /// Filter predicate for a single lower-cased, punctuation-stripped token.
    pub fn keep(&self, token: &str) -> bool {
        if token.is_empty() || !token.chars().all(char::is_alphanumeric) {
            return false;
        }
        if self.settings.min_len > 0 && token.chars().count() < self.settings.min_len {
            return false;
        }
        if self.settings.drop_numeric && token.chars().all(char::is_numeric) {
            return false;
        }
        !self.stop_words.contains(token)
    }
}

fn strip_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| {
        c.is_ascii_punctuation()
            || matches!(c, '“' | '”' | '‘' | '’' | '«' | '»' | '…' | '—' | '–')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(TokenizerSettings::default(), StopWords::english())
    }

    #[test]
    fn test_counts_and_lowercases() {
        let counts = tokenizer().count("Climate talks: CLIMATE deal reached. Climate!");
        assert_eq!(counts.get("climate"), Some(3));
        assert_eq!(counts.get("talks"), Some(1));
        assert_eq!(counts.get("deal"), Some(1));
        assert_eq!(counts.get("reached"), Some(1));
    }

    #[test]
    fn test_filter_rules() {
        let counts = tokenizer().count("The 2024 budget said would cut tax by 1500 for families");
        // stop words
        assert_eq!(counts.get("the"), None);
        assert_eq!(counts.get("said"), None);
        assert_eq!(counts.get("would"), None);
        // too short
        assert_eq!(counts.get("cut"), None);
        assert_eq!(counts.get("tax"), None);
        // numeric
        assert_eq!(counts.get("2024"), None);
        assert_eq!(counts.get("1500"), None);
        assert_eq!(counts.get("budget"), Some(1));
        assert_eq!(counts.get("families"), Some(1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_alphanumeric_mix_is_kept() {
        let counts = tokenizer().count("covid19 spread");
        assert_eq!(counts.get("covid19"), Some(1));
    }

    #[test]
    fn test_whitespace_mode_strips_punctuation() {
        let t = Tokenizer::new(
            TokenizerSettings {
                split: SplitMode::Whitespace,
                ..TokenizerSettings::default()
            },
            StopWords::english(),
        );
        let counts = t.count("(Markets) \"rallied\", markets... e-mail don't");
        assert_eq!(counts.get("markets"), Some(2));
        assert_eq!(counts.get("rallied"), Some(1));
        // inner punctuation fails the alphanumeric check
        assert_eq!(counts.get("e-mail"), None);
        assert_eq!(counts.get("don't"), None);
    }

    #[test]
    fn test_disabled_predicates() {
        let t = Tokenizer::new(
            TokenizerSettings {
                split: SplitMode::Words,
                min_len: 0,
                drop_numeric: false,
            },
            StopWords::empty(),
        );
        let counts = t.count("The tax in 2024");
        assert_eq!(counts.get("the"), Some(1));
        assert_eq!(counts.get("tax"), Some(1));
        assert_eq!(counts.get("in"), Some(1));
        assert_eq!(counts.get("2024"), Some(1));
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        assert!(tokenizer().count("").is_empty());
        assert!(tokenizer().count("  \n\t ").is_empty());
    }

    #[test]
    fn test_no_output_token_breaks_filter() {
        let t = tokenizer();
        let stop = StopWords::english();
        let samples = [
            "Breaking: the U.S. Senate voted 52–48 on Tuesday… «Reuters» reports!",
            "Über-große Städte & naïve café owners' protests — 3rd day running",
            "a an the of and but said also could would 12345 abc 1e10 ok wow",
            "“Quoted” ‘single’ (parenthetical) [bracketed] {braced} trailing; colon:",
        ];
        for sample in samples {
            for (token, count) in t.count(sample).iter() {
                assert!(count > 0);
                assert!(token.chars().count() > 3, "too short: {token}");
                assert!(token.chars().all(char::is_alphanumeric), "not alnum: {token}");
                assert!(!token.chars().all(char::is_numeric), "numeric: {token}");
                assert!(!stop.contains(token), "stop word: {token}");
            }
        }
    }
}
