//! Dynamic fetching through a headless browser.
//!
//! Pages that build their content with JavaScript, or only load more of it
//! as the reader scrolls, are rendered in headless Chromium. The page is
//! scrolled repeatedly and the visible headings, paragraphs, list items and
//! articles are collected after each scroll.
//!
//! # Termination
//!
//! Scrolling stops as soon as the document height stops growing. Pages that
//! keep growing are cut off by two hard bounds, [`ScrollSettings::max_scrolls`]
//! and [`ScrollSettings::max_scroll_secs`], whichever trips first.
//!
//! The scroll loop ([`collect_scrolled_text`]) only needs the small
//! [`ScrollPage`] surface, so it is independent of the browser driver. The
//! Chromium-backed `BrowserFetcher` is compiled with the `browser` feature.

use super::FetchError;
use crate::utils::collapse_whitespace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Visible-text probe run inside the page after every scroll.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub const VISIBLE_TEXT_JS: &str = r#"
(() => {
    function isVisible(elem) {
        if (!(elem instanceof Element)) return false;
        const style = getComputedStyle(elem);
        if (style.display === 'none') return false;
        if (style.visibility !== 'visible') return false;
        if (parseFloat(style.opacity) < 0.1) return false;
        const rect = elem.getBoundingClientRect();
        return !(rect.width === 0 || rect.height === 0);
    }
    if (!document.body || !isVisible(document.body)) return [];
    return Array.from(document.body.querySelectorAll('h1,h2,h3,h4,h5,h6,p,li,article'))
        .filter(el => isVisible(el))
        .map(el => el.textContent.trim())
        .filter(text => text.length > 0);
})()
"#;

/// Scroll and wait bounds for the dynamic strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Pause after each scroll so lazy content can load, in milliseconds.
    pub scroll_pause_ms: u64,
    /// Upper bound on navigation and on waiting for `<body>`, in seconds.
    pub page_wait_secs: u64,
    /// Hard cap on scroll iterations per page.
    pub max_scrolls: usize,
    /// Hard cap on total scrolling time per page, in seconds.
    pub max_scroll_secs: u64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            scroll_pause_ms: 1500,
            page_wait_secs: 10,
            max_scrolls: 25,
            max_scroll_secs: 90,
        }
    }
}

impl ScrollSettings {
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    pub fn page_wait(&self) -> Duration {
        Duration::from_secs(self.page_wait_secs)
    }

    pub fn max_scroll_time(&self) -> Duration {
        Duration::from_secs(self.max_scroll_secs)
    }
}

/// The operations the scroll loop needs from a rendered page.
pub trait ScrollPage {
    /// Text of every currently visible content element.
    async fn visible_text(&self) -> Result<Vec<String>, FetchError>;
    /// Scroll the viewport to the bottom of the document.
    async fn scroll_to_bottom(&self) -> Result<(), FetchError>;
    /// Current `document.body.scrollHeight`.
    async fn scroll_height(&self) -> Result<u64, FetchError>;
}

/// Scroll `page` until its height converges or a bound trips, collecting
/// distinct visible text chunks along the way.
///
/// Chunks are whitespace-normalized and de-duplicated; the first occurrence
/// keeps its position, so the result reads roughly top to bottom.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
#[instrument(level = "debug", skip_all)]
pub async fn collect_scrolled_text<P: ScrollPage>(
    page: &P,
    settings: &ScrollSettings,
) -> Result<String, FetchError> {
    let started = Instant::now();
    let mut last_height = page.scroll_height().await?;
    let mut seen = HashSet::new();
    let mut chunks = Vec::new();
    let mut scrolls = 0usize;

    loop {
        for raw in page.visible_text().await? {
            let cleaned = collapse_whitespace(&raw);
            if !cleaned.is_empty() && seen.insert(cleaned.clone()) {
                chunks.push(cleaned);
            }
        }

        if scrolls >= settings.max_scrolls {
            warn!(scrolls, height = last_height, "Scroll cap reached; page still growing");
            break;
        }
        if started.elapsed() >= settings.max_scroll_time() {
            warn!(scrolls, elapsed = ?started.elapsed(), "Scroll time budget exhausted");
            break;
        }

        page.scroll_to_bottom().await?;
        scrolls += 1;
        sleep(settings.scroll_pause()).await;

        let new_height = page.scroll_height().await?;
        debug!(scrolls, last_height, new_height, chunks = chunks.len(), "Scrolled");
        if new_height == last_height {
            break;
        }
        last_height = new_height;
    }

    Ok(chunks.join(" "))
}

#[cfg(feature = "browser")]
pub use chromium::BrowserFetcher;

#[cfg(feature = "browser")]
mod chromium {
    use super::{ScrollPage, ScrollSettings, VISIBLE_TEXT_JS, collect_scrolled_text};
    use crate::fetchers::{FetchError, PageFetcher};
    use crate::models::PageContent;
    use chromiumoxide::Page;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, timeout};
    use tracing::{info, instrument, warn};

    fn cdp(e: impl std::fmt::Display) -> FetchError {
        FetchError::Browser(e.to_string())
    }

    impl ScrollPage for Page {
        async fn visible_text(&self) -> Result<Vec<String>, FetchError> {
            self.evaluate(VISIBLE_TEXT_JS)
                .await
                .map_err(cdp)?
                .into_value::<Vec<String>>()
                .map_err(cdp)
        }

        async fn scroll_to_bottom(&self) -> Result<(), FetchError> {
            self.evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await
                .map_err(cdp)?;
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, FetchError> {
            self.evaluate("document.body.scrollHeight")
                .await
                .map_err(cdp)?
                .into_value::<u64>()
                .map_err(cdp)
        }
    }

    /// A headless Chromium session reused across all URLs of a run.
    ///
    /// The browser is an external process: call [`BrowserFetcher::close`]
    /// once the run is over, whether it succeeded or not.
    pub struct BrowserFetcher {
        browser: Browser,
        handler: JoinHandle<()>,
        settings: ScrollSettings,
    }

    impl BrowserFetcher {
        /// Launch headless Chromium.
        ///
        /// # Errors
        ///
        /// Fails if no Chromium binary can be found or it refuses to start.
        #[instrument(level = "info", skip_all)]
        pub async fn launch(settings: &ScrollSettings) -> Result<Self, FetchError> {
            let config = BrowserConfig::builder()
                .window_size(1920, 1080)
                .args(["--disable-gpu", "--disable-extensions", "--start-maximized"])
                .build()
                .map_err(FetchError::Browser)?;

            let (browser, mut events) = Browser::launch(config).await.map_err(cdp)?;
            let handler = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            info!("Headless browser launched");
            Ok(Self {
                browser,
                handler,
                settings: settings.clone(),
            })
        }

        /// Shut the browser down and reap its process.
        #[instrument(level = "info", skip_all)]
        pub async fn close(mut self) {
            if let Err(e) = self.browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            if let Err(e) = self.browser.wait().await {
                warn!(error = %e, "Failed waiting for browser process");
            }
            self.handler.abort();
            info!("Headless browser released");
        }

        async fn wait_for_body(&self, page: &Page) -> Result<(), FetchError> {
            let wait = self.settings.page_wait();
            timeout(wait, async {
                while page.find_element("body").await.is_err() {
                    sleep(Duration::from_millis(250)).await;
                }
            })
            .await
            .map_err(|_| FetchError::Timeout(wait))
        }
    }

    impl PageFetcher for BrowserFetcher {
        #[instrument(level = "info", skip_all, fields(%url))]
        async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
            let wait = self.settings.page_wait();
            let page = timeout(wait, self.browser.new_page(url))
                .await
                .map_err(|_| FetchError::Timeout(wait))?
                .map_err(cdp)?;

            let result = match self.wait_for_body(&page).await {
                Ok(()) => collect_scrolled_text(&page, &self.settings).await,
                Err(e) => Err(e),
            };

            if let Err(e) = page.close().await {
                warn!(error = %e, "Failed to close page");
            }
            result.map(PageContent::Text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Page whose height follows a script; the last height repeats forever.
    struct FakePage {
        heights: RefCell<Vec<u64>>,
        frames: RefCell<Vec<Vec<&'static str>>>,
        scrolls: Cell<usize>,
    }

    impl FakePage {
        fn new(heights: &[u64], frames: Vec<Vec<&'static str>>) -> Self {
            Self {
                heights: RefCell::new(heights.iter().rev().copied().collect()),
                frames: RefCell::new(frames.into_iter().rev().collect()),
                scrolls: Cell::new(0),
            }
        }
    }

    impl ScrollPage for FakePage {
        async fn visible_text(&self) -> Result<Vec<String>, FetchError> {
            let mut frames = self.frames.borrow_mut();
            let frame = if frames.len() > 1 {
                frames.pop().unwrap_or_default()
            } else {
                frames.last().cloned().unwrap_or_default()
            };
            Ok(frame.into_iter().map(String::from).collect())
        }

        async fn scroll_to_bottom(&self) -> Result<(), FetchError> {
            self.scrolls.set(self.scrolls.get() + 1);
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, FetchError> {
            let mut heights = self.heights.borrow_mut();
            if heights.len() > 1 {
                Ok(heights.pop().unwrap_or_default())
            } else {
                Ok(heights.last().copied().unwrap_or_default())
            }
        }
    }

    /// Page whose height grows on every read.
    struct EndlessPage {
        height: Cell<u64>,
        scrolls: Cell<usize>,
    }

    impl ScrollPage for EndlessPage {
        async fn visible_text(&self) -> Result<Vec<String>, FetchError> {
            Ok(vec![format!("story {}", self.scrolls.get())])
        }

        async fn scroll_to_bottom(&self) -> Result<(), FetchError> {
            self.scrolls.set(self.scrolls.get() + 1);
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, FetchError> {
            self.height.set(self.height.get() + 1000);
            Ok(self.height.get())
        }
    }

    struct BrokenPage;

    impl ScrollPage for BrokenPage {
        async fn visible_text(&self) -> Result<Vec<String>, FetchError> {
            Err(FetchError::Browser("target closed".into()))
        }

        async fn scroll_to_bottom(&self) -> Result<(), FetchError> {
            Ok(())
        }

        async fn scroll_height(&self) -> Result<u64, FetchError> {
            Ok(100)
        }
    }

    fn fast() -> ScrollSettings {
        ScrollSettings {
            scroll_pause_ms: 0,
            ..ScrollSettings::default()
        }
    }

    #[tokio::test]
    async fn test_stops_when_height_converges() {
        let page = FakePage::new(
            &[1000, 2000, 3000, 3000],
            vec![
                vec!["Top  story", "Weather"],
                vec!["Top story", "Second\n story"],
                vec!["Third story", "Weather"],
            ],
        );
        let text = collect_scrolled_text(&page, &fast()).await.unwrap();
        assert_eq!(page.scrolls.get(), 3);
        assert_eq!(text, "Top story Weather Second story Third story");
    }

    #[tokio::test]
    async fn test_static_page_scrolls_once() {
        let page = FakePage::new(&[800], vec![vec!["Only", "", "   "]]);
        let text = collect_scrolled_text(&page, &fast()).await.unwrap();
        assert_eq!(page.scrolls.get(), 1);
        assert_eq!(text, "Only");
    }

    #[tokio::test]
    async fn test_endless_page_hits_scroll_cap() {
        let page = EndlessPage {
            height: Cell::new(0),
            scrolls: Cell::new(0),
        };
        let settings = ScrollSettings {
            max_scrolls: 5,
            ..fast()
        };
        let text = collect_scrolled_text(&page, &settings).await.unwrap();
        assert_eq!(page.scrolls.get(), 5);
        assert!(text.starts_with("story 0"));
        assert!(text.contains("story 5"));
    }

    #[tokio::test]
    async fn test_endless_page_hits_time_budget() {
        let page = EndlessPage {
            height: Cell::new(0),
            scrolls: Cell::new(0),
        };
        let settings = ScrollSettings {
            scroll_pause_ms: 20,
            max_scrolls: usize::MAX,
            max_scroll_secs: 0,
            ..ScrollSettings::default()
        };
        collect_scrolled_text(&page, &settings).await.unwrap();
        assert_eq!(page.scrolls.get(), 0);
    }

    #[tokio::test]
    async fn test_driver_errors_propagate() {
        let err = collect_scrolled_text(&BrokenPage, &fast()).await.unwrap_err();
        assert!(matches!(err, FetchError::Browser(ref m) if m == "target closed"));
    }

    #[test]
    fn test_default_bounds_are_finite() {
        let s = ScrollSettings::default();
        assert_eq!(s.scroll_pause(), Duration::from_millis(1500));
        assert_eq!(s.page_wait(), Duration::from_secs(10));
        assert!(s.max_scrolls > 0);
        assert_eq!(s.max_scroll_time(), Duration::from_secs(90));
    }
}
