#![allow(clippy::too_many_arguments)]

// Re-export modules
pub mod cache;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod extractors;
pub mod filter;
pub mod ledger;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod relevance;
pub mod results;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{HarvestConfig, SiteProfile};
pub use error::{FetchError, HarvestError};
pub use extractors::Publisher;
pub use pipeline::RunSummary;
pub use results::ArticleRecord;

use crawlers::web::WebFetcher;
use std::path::PathBuf;

/// Main builder for a harvest run
pub struct Harvest {
    config: HarvestConfig,
    webdriver_url: Option<String>,
}

impl Default for Harvest {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvest {
    /// Create a builder over the built-in site table and defaults
    pub fn new() -> Self {
        Self::with_config(HarvestConfig::default())
    }

    /// Start from an existing configuration
    pub fn with_config(config: HarvestConfig) -> Self {
        Self {
            config,
            webdriver_url: None,
        }
    }

    /// Load configuration from a file
    pub fn with_config_file(path: impl AsRef<std::path::Path>) -> Result<Self, HarvestError> {
        Ok(Self::with_config(HarvestConfig::from_file(path)?))
    }

    /// Load configuration from a string
    pub fn with_config_str(config_str: &str) -> Result<Self, HarvestError> {
        Ok(Self::with_config(HarvestConfig::from_json(config_str)?))
    }

    /// Folder for the output table, the ledger and the per-site folders
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Use this WebDriver URL, taking precedence over `WEBDRIVER_URL`
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    /// Restrict the run to the named sites
    pub fn with_sites(mut self, names: &[String]) -> Result<Self, HarvestError> {
        self.config.retain_sites(names)?;
        Ok(self)
    }

    /// Replace the relevance keywords; an empty list keeps the current ones
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.config.keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        }
        self
    }

    /// Set the hard cap on pagination clicks per site
    pub fn with_max_clicks(mut self, max_clicks: usize) -> Self {
        self.config.limits.max_clicks = max_clicks;
        self
    }

    /// Configuration the run will use, before the environment is applied
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Resolve the final configuration: explicit URL, then `WEBDRIVER_URL`, then the file/default
    pub fn resolve(self) -> Result<HarvestConfig, HarvestError> {
        let mut config = self.config;

        match self.webdriver_url {
            Some(url) => config.webdriver_url = url,
            None => {
                // Override the WebDriver URL with an environment variable if provided
                if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
                    if !webdriver_url.is_empty() {
                        config.webdriver_url = webdriver_url;
                    }
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Harvest every selected site, one browser session per site
    pub async fn run(self) -> Result<RunSummary, HarvestError> {
        let config = self.resolve()?;
        ::log::info!(
            "Harvesting {} sites into {} (WebDriver at {})",
            config.sites.len(),
            config.output_dir.display(),
            config.webdriver_url
        );

        pipeline::run_sites(&config, || WebFetcher::connect(&config)).await
    }
}
