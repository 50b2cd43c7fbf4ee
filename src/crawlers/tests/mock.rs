use crate::crawlers::crawler::PageFetcher;
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Listing page with the given hrefs inside `div.list`
pub(crate) fn listing(hrefs: &[&str]) -> String {
    let anchors = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{}">item</a></li>"#, href))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"<html><body>
<nav><a href="https://example.com/about">About</a></nav>
<div class="list"><ul>
{}
</ul></div>
</body></html>"#,
        anchors
    )
}

/// In-memory fetcher serving canned pages and recording every call
#[derive(Debug, Default)]
pub(crate) struct MockFetcher {
    pub static_pages: HashMap<String, String>,
    pub rendered_pages: HashMap<String, String>,
    /// DOM after the n-th click since the last navigation; the last one repeats
    pub dom_after_clicks: Vec<String>,
    pub clicks_available: usize,
    pub click_fails: bool,
    /// Page a click navigates to, instead of growing the current DOM
    pub url_after_click: Option<String>,
    /// PNG returned by `capture_full_page`; `None` makes capture fail
    pub screenshot: Option<Vec<u8>>,
    pub cookie_banner: bool,

    pub current: Option<String>,
    pub dom_state: usize,
    pub clicks: usize,
    pub static_requests: Vec<String>,
    pub renders: Vec<String>,
    pub cookie_clicks: usize,
    pub scrolls: usize,
    /// Shared so a caller can check it after handing the fetcher away
    pub closed: Arc<AtomicBool>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static(mut self, url: &str, html: String) -> Self {
        self.static_pages.insert(url.to_string(), html);
        self
    }

    pub fn with_rendered(mut self, url: &str, html: String) -> Self {
        self.rendered_pages.insert(url.to_string(), html);
        self
    }

    pub fn with_clicks(mut self, available: usize, states: Vec<String>) -> Self {
        self.clicks_available = available;
        self.dom_after_clicks = states;
        self
    }

    pub fn with_navigating_clicks(mut self, available: usize, url: &str) -> Self {
        self.clicks_available = available;
        self.url_after_click = Some(url.to_string());
        self
    }

    pub fn with_close_flag(mut self, closed: Arc<AtomicBool>) -> Self {
        self.closed = closed;
        self
    }

    pub fn static_requests_for(&self, url: &str) -> usize {
        self.static_requests.iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_static(&mut self, url: &str) -> Result<String, FetchError> {
        self.static_requests.push(url.to_string());
        self.static_pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Timeout(format!("GET {}", url)))
    }

    async fn render(&mut self, url: &str) -> Result<(), FetchError> {
        self.renders.push(url.to_string());
        if self.rendered_pages.contains_key(url) {
            self.current = Some(url.to_string());
            self.dom_state = 0;
            Ok(())
        } else {
            Err(FetchError::Timeout(format!("body of {}", url)))
        }
    }

    async fn current_url(&mut self) -> Result<String, FetchError> {
        self.current
            .clone()
            .ok_or_else(|| FetchError::Script("no page loaded".to_string()))
    }

    async fn rendered_source(&mut self) -> Result<String, FetchError> {
        if self.dom_state > 0 && !self.dom_after_clicks.is_empty() {
            let index = self.dom_state.min(self.dom_after_clicks.len()) - 1;
            return Ok(self.dom_after_clicks[index].clone());
        }
        let current = self.current_url().await?;
        self.rendered_pages
            .get(&current)
            .cloned()
            .ok_or_else(|| FetchError::Script(format!("no source for {}", current)))
    }

    async fn click_control(&mut self, _xpath: &str) -> Result<bool, FetchError> {
        if self.click_fails {
            return Err(FetchError::Script("element not interactable".to_string()));
        }
        if self.clicks >= self.clicks_available {
            return Ok(false);
        }
        self.clicks += 1;
        match &self.url_after_click {
            Some(url) => {
                self.current = Some(url.clone());
                self.dom_state = 0;
            }
            None => self.dom_state += 1,
        }
        Ok(true)
    }

    async fn dismiss_cookies(&mut self, _xpath: &str) -> bool {
        if self.cookie_banner {
            self.cookie_clicks += 1;
            self.cookie_banner = false;
            true
        } else {
            false
        }
    }

    async fn scroll_through(&mut self) -> Result<(), FetchError> {
        self.scrolls += 1;
        Ok(())
    }

    async fn capture_full_page(&mut self) -> Result<Vec<u8>, FetchError> {
        self.screenshot
            .clone()
            .ok_or_else(|| FetchError::Script("screenshot unavailable".to_string()))
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
