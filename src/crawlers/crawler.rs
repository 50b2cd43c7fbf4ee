use crate::error::FetchError;
use async_trait::async_trait;

/// Everything the harvest needs from the network: plain HTTP and a browser.
///
/// Link discovery, the HTML cache and the snapshot producer only talk to this
/// trait, so a site run can be replayed against canned pages.
#[async_trait]
pub trait PageFetcher: Send {
    /// Raw markup of `url` over plain HTTP. Non-success statuses are errors.
    async fn fetch_static(&mut self, url: &str) -> Result<String, FetchError>;

    /// Navigate the browser to `url` and wait for `body`
    async fn render(&mut self, url: &str) -> Result<(), FetchError>;

    /// URL the browser is currently showing
    async fn current_url(&mut self) -> Result<String, FetchError>;

    /// Markup of the current rendered DOM
    async fn rendered_source(&mut self) -> Result<String, FetchError>;

    /// Scroll the pagination control into view and click it.
    ///
    /// `Ok(false)` when the control does not appear within the bounded wait.
    async fn click_control(&mut self, xpath: &str) -> Result<bool, FetchError>;

    /// Click the cookie banner's accept button if it shows up
    async fn dismiss_cookies(&mut self, xpath: &str) -> bool;

    /// Scroll through the page so lazy content loads
    async fn scroll_through(&mut self) -> Result<(), FetchError>;

    /// Resize the viewport to the whole document and take a PNG screenshot
    async fn capture_full_page(&mut self) -> Result<Vec<u8>, FetchError>;

    /// Release the browser session
    async fn close(&mut self);
}
