//! Readable-text extraction from raw HTML.
//!
//! Boilerplate subtrees (scripts, styles, navigation, headers, footers) are
//! skipped entirely. What remains is rendered in one of two ways:
//!
//! - [`ExtractMode::Regions`]: probe a prioritized list of content selectors
//!   and return the text of the first one that matches anything, falling back
//!   to the whole page.
//! - [`ExtractMode::Structured`]: walk headings, paragraphs and list items in
//!   document order, keeping headings on their own lines and tagging the
//!   document title.

use crate::utils::{collapse_blank_lines, collapse_whitespace};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing::{debug, instrument};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static STRUCTURE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p, li").unwrap());

/// Elements that end a run of inline text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre",
    "section", "table", "td", "th", "title", "tr", "ul",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    #[default]
    Regions,
    Structured,
}

/// Extraction settings as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub mode: ExtractMode,
    /// Tag names whose whole subtree is dropped.
    pub denylist: Vec<String>,
    /// Content-region selectors, highest priority first.
    pub selectors: Vec<String>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Regions,
            denylist: ["script", "style", "nav", "header", "footer"]
                .into_iter()
                .map(String::from)
                .collect(),
            selectors: ["article", ".article-content", ".story-content"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Compiled extractor. Cheap to share; holds parsed selectors only.
#[derive(Debug)]
pub struct Extractor {
    mode: ExtractMode,
    denylist: Vec<String>,
    regions: Vec<(String, Selector)>,
}

impl Extractor {
    /// Compile the configured selectors.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first selector that fails to parse.
    pub fn new(settings: &ExtractSettings) -> Result<Self, Box<dyn Error>> {
        let mut regions = Vec::with_capacity(settings.selectors.len());
        for raw in &settings.selectors {
            let selector = Selector::parse(raw)
                .map_err(|e| format!("invalid content selector {raw:?}: {e}"))?;
            regions.push((raw.clone(), selector));
        }
        Ok(Self {
            mode: settings.mode,
            denylist: settings.denylist.iter().map(|t| t.to_ascii_lowercase()).collect(),
            regions,
        })
    }

    /// Return the readable text of `html` according to the configured mode.
    #[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
    pub fn extract(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        match self.mode {
            ExtractMode::Regions => self.extract_regions(&document),
            ExtractMode::Structured => self.extract_structured(&document),
        }
    }

    fn extract_regions(&self, document: &Html) -> String {
        for (raw, selector) in &self.regions {
            let texts: Vec<String> = document
                .select(selector)
                .filter(|el| !self.inside_denied(*el))
                .map(|el| self.element_text(el))
                .collect();
            if !texts.is_empty() {
                debug!(selector = %raw, matches = texts.len(), "Content region matched");
                return collapse_whitespace(&texts.join(" "));
            }
        }
        debug!("No content region matched; using whole page");
        self.element_text(document.root_element())
    }

    fn extract_structured(&self, document: &Html) -> String {
        let mut parts = Vec::new();

        if let Some(title) = document.select(&TITLE).next() {
            let title = collapse_whitespace(&title.text().collect::<String>());
            if !title.is_empty() {
                parts.push(format!("Title: {title}\n"));
            }
        }

        for el in document.select(&STRUCTURE) {
            if self.inside_denied(el) {
                continue;
            }
            let text = self.element_text(el);
            if text.is_empty() {
                continue;
            }
            if is_heading(el.value().name()) {
                parts.push(format!("\n{text}\n"));
            } else {
                parts.push(text);
            }
        }

        collapse_blank_lines(&parts.join("\n")).trim().to_string()
    }

    /// Whitespace-normalized text of `element`, skipping denylisted subtrees.
    fn element_text(&self, element: ElementRef<'_>) -> String {
        let mut out = String::new();
        self.collect_text(element, &mut out);
        collapse_whitespace(&out)
    }

    fn collect_text(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    let name = el.name();
                    if self.is_denied(name) {
                        continue;
                    }
                    let block = BLOCK_TAGS.contains(&name);
                    if block {
                        out.push(' ');
                    }
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.collect_text(child_el, out);
                    }
                    if block {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    fn inside_denied(&self, element: ElementRef<'_>) -> bool {
        self.is_denied(element.value().name())
            || element.ancestors().any(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|el| self.is_denied(el.name()))
            })
    }

    fn is_denied(&self, name: &str) -> bool {
        self.denylist.iter().any(|d| d == name)
    }
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions() -> Extractor {
        Extractor::new(&ExtractSettings::default()).unwrap()
    }

    fn structured() -> Extractor {
        Extractor::new(&ExtractSettings {
            mode: ExtractMode::Structured,
            ..ExtractSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_article_beats_navigation() {
        let html = "<html><body><nav>X</nav><article><p>Hello world</p></article></body></html>";
        let text = regions().extract(html);
        assert!(text.contains("Hello world"));
        assert!(!text.contains('X'));
    }

    #[test]
    fn test_selector_priority() {
        let html = r#"<html><body>
            <div class="story-content">Story text</div>
            <div class="article-content">Article body</div>
        </body></html>"#;
        let text = regions().extract(html);
        assert_eq!(text, "Article body");
    }

    #[test]
    fn test_multiple_matches_are_concatenated() {
        let html = "<body><article>First piece</article><article>Second piece</article></body>";
        assert_eq!(regions().extract(html), "First piece Second piece");
    }

    #[test]
    fn test_fallback_to_whole_page_without_boilerplate() {
        let html = r#"<html><head><script>var tracking = 1;</script><style>p{}</style></head>
            <body><header>Site Header</header><div><p>Markets</p><p>rallied</p></div>
            <footer>Copyright</footer></body></html>"#;
        let text = regions().extract(html);
        assert_eq!(text, "Markets rallied");
    }

    #[test]
    fn test_match_inside_denied_subtree_is_ignored() {
        let html = r#"<body><nav><article>Menu teaser</article></nav>
            <div class="story-content">Real story</div></body>"#;
        assert_eq!(regions().extract(html), "Real story");
    }

    #[test]
    fn test_script_inside_article_is_dropped() {
        let html = "<article><p>Visible</p><script>hidden()</script></article>";
        assert_eq!(regions().extract(html), "Visible");
    }

    #[test]
    fn test_structured_mode_layout() {
        let html = r#"<html><head><title> Daily  Brief </title></head><body>
            <nav><li>Home</li></nav>
            <h1>Headline</h1>
            <p>First paragraph.</p>
            <ul><li>Point one</li></ul>
            <h2>Section</h2>
            <p>Closing.</p>
        </body></html>"#;
        let text = structured().extract(html);
        assert_eq!(
            text,
            "Title: Daily Brief\n\nHeadline\n\nFirst paragraph.\nPoint one\n\nSection\n\nClosing."
        );
        assert!(!text.contains("Home"));
    }

    #[test]
    fn test_structured_mode_empty_document() {
        assert_eq!(structured().extract(""), "");
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let settings = ExtractSettings {
            selectors: vec!["article[".to_string()],
            ..ExtractSettings::default()
        };
        let err = Extractor::new(&settings).unwrap_err();
        assert!(err.to_string().contains("article["));
    }
}
