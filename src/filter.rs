use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Configuration for the link post-filter shared by both extraction backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host every kept link must have (the base URL's network location)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_host: Option<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for UrlFilterConfig {
    fn default() -> Self {
        Self {
            required_host: None,
            exclude_patterns: vec![
                // Pagination artifacts would make the link set feed on itself
                r"page=".to_string(),
                r"/page/".to_string(),
                // Downloads and web assets are never article pages
                r"(?i)\.(pdf|jpg|jpeg|png|gif|css|js|ico|svg|woff|woff2|ttf|eot|zip|docx?|xlsx?|pptx?|mp3|mp4)$"
                    .to_string(),
            ],
        }
    }
}

/// Decides which discovered hrefs may enter a site's link set
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(UrlFilterConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Default exclusions, scoped to the host of `base_url`
    pub fn for_base(base_url: &Url) -> Self {
        let mut filter = Self::default();
        filter.config.required_host = base_url.host_str().map(|h| h.to_string());
        filter
    }

    /// Checks everything except the host: scheme, pagination artifacts, extensions.
    ///
    /// Returns the link with its fragment removed when it passes.
    pub fn accept_href(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if !(href.starts_with("http://") || href.starts_with("https://")) {
            return None;
        }

        let url = Url::parse(href).ok()?;
        let normalized = self.normalize_url(&url);
        let url_str = normalized.as_str();

        // Check the path without a query too, so `report.pdf?dl=1` is caught
        let mut without_query = normalized.clone();
        without_query.set_query(None);

        for regex in &self.exclude_regexes {
            if regex.is_match(url_str) || regex.is_match(without_query.as_str()) {
                return None;
            }
        }

        Some(url_str.to_string())
    }

    /// Whether a URL's network location matches the required host
    pub fn is_in_domain(&self, url: &str) -> bool {
        let Some(required) = &self.config.required_host else {
            return true;
        };
        match Url::parse(url) {
            Ok(parsed) => parsed.host_str() == Some(required.as_str()),
            Err(_) => false,
        }
    }

    /// Backend post-filter: scheme, artifacts, extensions, dedup. No domain check.
    pub fn post_filter<I, S>(&self, hrefs: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        hrefs
            .into_iter()
            .filter_map(|href| self.accept_href(href.as_ref()))
            .collect()
    }

    /// Full post-filter: scheme, artifacts, extensions, domain, dedup.
    pub fn filter_links<I, S>(&self, hrefs: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.post_filter(hrefs)
            .into_iter()
            .filter(|link| self.is_in_domain(link))
            .collect()
    }

    /// Create a normalized version of the URL (e.g., removing fragments)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}
