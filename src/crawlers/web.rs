use crate::config::{HarvestConfig, Timing};
use crate::crawlers::crawler::PageFetcher;
use crate::error::FetchError;
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use tokio::time::sleep;

/// Pixels scrolled per step when walking down a page
const SCROLL_STEP: u64 = 600;

/// Upper bound on scroll steps for pages that keep growing
const MAX_SCROLL_STEPS: usize = 200;

/// Plain HTTP client plus one WebDriver session, owned for the duration of a site.
pub struct WebFetcher {
    http: reqwest::Client,
    client: Option<Client>,
    timing: Timing,
}

impl WebFetcher {
    /// Build the HTTP client and open the browser session.
    ///
    /// Failing to reach any WebDriver server is fatal for the site being harvested.
    pub async fn connect(config: &HarvestConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timing.request_timeout())
            .build()?;

        let client = connect_to_webdriver(config).await?;

        Ok(Self {
            http,
            client: Some(client),
            timing: config.timing,
        })
    }

    fn client(&self) -> Result<&Client, FetchError> {
        self.client
            .as_ref()
            .ok_or_else(|| FetchError::Script("browser session already closed".to_string()))
    }

    async fn script_number(&self, script: &str) -> Result<u64, FetchError> {
        let value = self.client()?.execute(script, vec![]).await?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f.max(0.0) as u64))
            .ok_or_else(|| FetchError::Script(format!("{} returned {}", script, value)))
    }

    async fn scroll_into_view(&self, element: &fantoccini::elements::Element) -> Result<(), FetchError> {
        let arg = serde_json::to_value(element).map_err(|e| FetchError::Script(e.to_string()))?;
        self.client()?
            .execute("arguments[0].scrollIntoView(true);", vec![arg])
            .await?;
        Ok(())
    }
}

/// Capabilities for a headless desktop-sized Chrome
fn capabilities(config: &HarvestConfig) -> serde_json::Map<String, Value> {
    let mut args = vec![
        "--window-size=1920,1200".to_string(),
        "--log-level=3".to_string(),
        format!("--user-agent={}", config.user_agent),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = serde_json::Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(config: &HarvestConfig) -> Result<Client, FetchError> {
    let caps = capabilities(config);

    // Try to connect to the specified WebDriver URL
    let first_error = match ClientBuilder::native()
        .capabilities(caps.clone())
        .connect(&config.webdriver_url)
        .await
    {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e
        }
    };

    // If we couldn't connect, try with common alternative URLs
    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == config.webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native()
            .capabilities(caps.clone())
            .connect(url)
            .await
        {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(first_error.into())
}

/// Whether a command error just means "the element is not there"
fn is_missing_element(error: &CmdError) -> bool {
    matches!(error, CmdError::WaitTimeout) || error.is_no_such_element()
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch_static(&mut self, url: &str) -> Result<String, FetchError> {
        ::log::debug!("GET {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn render(&mut self, url: &str) -> Result<(), FetchError> {
        ::log::debug!("RENDER {}", url);
        let client = self.client()?;
        client.goto(url).await?;

        match client
            .wait()
            .at_most(self.timing.body_wait())
            .for_element(Locator::Css("body"))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_missing_element(&e) => {
                ::log::warn!("Timeout loading page: {}", url);
                Err(FetchError::Timeout(format!("body of {}", url)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn current_url(&mut self) -> Result<String, FetchError> {
        Ok(self.client()?.current_url().await?.to_string())
    }

    async fn rendered_source(&mut self) -> Result<String, FetchError> {
        Ok(self.client()?.source().await?)
    }

    async fn click_control(&mut self, xpath: &str) -> Result<bool, FetchError> {
        let element = match self
            .client()?
            .wait()
            .at_most(self.timing.control_wait())
            .for_element(Locator::XPath(xpath))
            .await
        {
            Ok(element) => element,
            Err(e) if is_missing_element(&e) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.scroll_into_view(&element).await?;
        sleep(self.timing.scroll_delay()).await;

        // A script click is not intercepted by sticky headers or overlays
        let arg = serde_json::to_value(&element).map_err(|e| FetchError::Script(e.to_string()))?;
        self.client()?
            .execute("arguments[0].click();", vec![arg])
            .await?;
        Ok(true)
    }

    async fn dismiss_cookies(&mut self, xpath: &str) -> bool {
        let Ok(client) = self.client() else {
            return false;
        };
        let element = match client
            .wait()
            .at_most(self.timing.cookie_wait())
            .for_element(Locator::XPath(xpath))
            .await
        {
            Ok(element) => element,
            Err(_) => {
                ::log::debug!("No cookie popup found");
                return false;
            }
        };

        if let Err(e) = self.scroll_into_view(&element).await {
            ::log::debug!("Could not scroll cookie button into view: {}", e);
        }
        sleep(self.timing.scroll_delay()).await;

        match element.click().await {
            Ok(_) => {
                ::log::info!("Accepted cookies");
                sleep(self.timing.scroll_delay()).await;
                true
            }
            Err(e) => {
                ::log::debug!("Cookie button not clickable: {}", e);
                false
            }
        }
    }

    async fn scroll_through(&mut self) -> Result<(), FetchError> {
        let mut height = self.script_number("return document.body.scrollHeight").await?;
        let mut position = 0;
        let mut steps = 0;

        while position < height && steps < MAX_SCROLL_STEPS {
            self.client()?
                .execute(&format!("window.scrollTo(0, {});", position), vec![])
                .await?;
            sleep(self.timing.scroll_delay()).await;
            position += SCROLL_STEP;
            steps += 1;
            height = self.script_number("return document.body.scrollHeight").await?;
        }

        sleep(self.timing.scroll_delay()).await;
        Ok(())
    }

    async fn capture_full_page(&mut self) -> Result<Vec<u8>, FetchError> {
        let size = async {
            let width = self
                .script_number("return document.documentElement.scrollWidth")
                .await?;
            let height = self
                .script_number("return document.documentElement.scrollHeight")
                .await?;
            Ok::<_, FetchError>((width, height))
        }
        .await;

        match size {
            Ok((width, height)) if width > 0 && height > 0 => {
                let width = u32::try_from(width).unwrap_or(u32::MAX);
                let height = u32::try_from(height).unwrap_or(u32::MAX);
                if let Err(e) = self.client()?.set_window_size(width, height).await {
                    ::log::warn!("Could not resize window to {}x{}: {}", width, height, e);
                } else {
                    // Give the layout a moment to settle at the new size
                    sleep(self.timing.scroll_delay()).await;
                }
            }
            Ok(_) => ::log::warn!("Document reported an empty size; keeping the window size"),
            Err(e) => ::log::warn!("Could not measure document: {}", e),
        }

        Ok(self.client()?.screenshot().await?)
    }

    async fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close browser session: {}", e);
            }
        }
    }
}
