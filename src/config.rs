use crate::error::HarvestError;
use crate::extractors::Publisher;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A (tag, class) pair naming the DOM subtree that holds a site's article list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLocator {
    pub tag: String,
    /// One or more space separated class names
    pub class: String,
}

impl ContainerLocator {
    pub fn new(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: class.to_string(),
        }
    }

    /// CSS form of the locator, e.g. `div.results` or `div.row.wide`
    pub fn css(&self) -> String {
        let classes = self.class.split_whitespace().collect::<Vec<_>>();
        if classes.is_empty() {
            self.tag.clone()
        } else {
            format!("{}.{}", self.tag, classes.join("."))
        }
    }
}

/// Static description of one target site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Identifier used for folder names and the `--site` filter
    pub name: String,

    /// Listing page that discovery starts from
    pub url: String,

    /// Container to restrict link search to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_container: Option<ContainerLocator>,

    /// XPath of the "next"/"load more" control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_button: Option<String>,

    /// XPath of the cookie consent accept button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_button: Option<String>,

    /// Whether `page=N` pagination is attempted before button pagination
    #[serde(default = "default_numeric_pagination")]
    pub numeric_pagination: bool,

    /// Skip plain HTTP when caching article HTML (sites that answer 403)
    #[serde(default)]
    pub render_html: bool,

    /// Field extractor for this site's articles
    pub publisher: Publisher,
}

/// Termination thresholds for the pagination phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLimits {
    /// Consecutive `page=N` requests without new links before giving up
    #[serde(default = "default_two")]
    pub empty_page_limit: usize,

    /// Consecutive button iterations yielding exactly one new link
    #[serde(default = "default_two")]
    pub single_link_limit: usize,

    /// Consecutive button iterations yielding no new links
    #[serde(default = "default_two")]
    pub no_new_link_limit: usize,

    /// Hard cap on control clicks per site
    #[serde(default = "default_max_clicks")]
    pub max_clicks: usize,

    /// Hard cap on `page=N` requests per site
    #[serde(default = "default_max_numeric_pages")]
    pub max_numeric_pages: usize,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            empty_page_limit: default_two(),
            single_link_limit: default_two(),
            no_new_link_limit: default_two(),
            max_clicks: default_max_clicks(),
            max_numeric_pages: default_max_numeric_pages(),
        }
    }
}

/// Fixed pauses and element waits, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Pause after each static fetch and between `page=N` requests
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Pause after each control click
    #[serde(default = "default_request_delay")]
    pub click_delay_ms: u64,

    /// Pause between scroll steps and around cookie clicks
    #[serde(default = "default_scroll_delay")]
    pub scroll_delay_ms: u64,

    /// Pause after navigating to a page before reading it
    #[serde(default = "default_html_delay")]
    pub page_settle_ms: u64,

    /// Wait for the pagination control to appear
    #[serde(default = "default_control_wait")]
    pub control_wait_ms: u64,

    /// Wait for `body` after navigation
    #[serde(default = "default_body_wait")]
    pub body_wait_ms: u64,

    /// Wait for the cookie banner button
    #[serde(default = "default_cookie_wait")]
    pub cookie_wait_ms: u64,

    /// Timeout of a plain HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            click_delay_ms: default_request_delay(),
            scroll_delay_ms: default_scroll_delay(),
            page_settle_ms: default_html_delay(),
            control_wait_ms: default_control_wait(),
            body_wait_ms: default_body_wait(),
            cookie_wait_ms: default_cookie_wait(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Timing {
    /// All pauses zeroed and waits shortened; used by tests.
    pub fn immediate() -> Self {
        Self {
            request_delay_ms: 0,
            click_delay_ms: 0,
            scroll_delay_ms: 0,
            page_settle_ms: 0,
            control_wait_ms: 10,
            body_wait_ms: 10,
            cookie_wait_ms: 10,
            request_timeout_ms: 1_000,
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn control_wait(&self) -> Duration {
        Duration::from_millis(self.control_wait_ms)
    }

    pub fn body_wait(&self) -> Duration {
        Duration::from_millis(self.body_wait_ms)
    }

    pub fn cookie_wait(&self) -> Duration {
        Duration::from_millis(self.cookie_wait_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Folder holding the output table, the ledger and per-site folders
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output table file name inside `output_dir`
    #[serde(default = "default_results_file")]
    pub results_file: String,

    /// Checked-link ledger file name inside `output_dir`
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent sent by both the HTTP client and the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Lower-case substrings that mark a page as relevant
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Write rows whose snapshot failed, with the failure in PDF PATH
    #[serde(default)]
    pub keep_failed_snapshots: bool,

    #[serde(default)]
    pub limits: PaginationLimits,

    #[serde(default)]
    pub timing: Timing,

    /// Sites to harvest, in order
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteProfile>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            results_file: default_results_file(),
            ledger_file: default_ledger_file(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            keywords: default_keywords(),
            keep_failed_snapshots: false,
            limits: PaginationLimits::default(),
            timing: Timing::default(),
            sites: default_sites(),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, HarvestError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make discovery meaningless
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(HarvestError::Config("at least one keyword is required".into()));
        }
        for site in &self.sites {
            if url::Url::parse(&site.url).is_err() {
                return Err(HarvestError::Config(format!(
                    "site {} has an invalid url: {}",
                    site.name, site.url
                )));
            }
        }
        Ok(())
    }

    /// Keep only the named sites, preserving table order
    pub fn retain_sites(&mut self, names: &[String]) -> Result<(), HarvestError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.sites.iter().any(|s| &s.name == *n))
        {
            return Err(HarvestError::Config(format!("unknown site: {}", unknown)));
        }
        self.sites.retain(|s| names.contains(&s.name));
        Ok(())
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(&self.ledger_file)
    }

    pub fn html_dir(&self, site: &SiteProfile) -> PathBuf {
        self.output_dir.join(format!("{}_htmls", site.name))
    }

    pub fn pdf_dir(&self, site: &SiteProfile) -> PathBuf {
        self.output_dir.join(format!("{}_pdfs", site.name))
    }
}

fn default_two() -> usize {
    2
}

fn default_max_clicks() -> usize {
    50
}

fn default_max_numeric_pages() -> usize {
    500
}

fn default_request_delay() -> u64 {
    3_000
}

fn default_scroll_delay() -> u64 {
    1_000
}

fn default_html_delay() -> u64 {
    2_000
}

fn default_control_wait() -> u64 {
    10_000
}

fn default_body_wait() -> u64 {
    15_000
}

fn default_cookie_wait() -> u64 {
    5_000
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("saved_sites")
}

fn default_results_file() -> String {
    "alz_articles.csv".to_string()
}

fn default_ledger_file() -> String {
    "checked_links.csv".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_numeric_pagination() -> bool {
    true
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/118.0.5993.117 Safari/537.36"
        .to_string()
}

fn default_keywords() -> Vec<String> {
    vec!["alzheim".to_string()]
}

/// Built-in site table
pub fn default_sites() -> Vec<SiteProfile> {
    vec![
        SiteProfile {
            name: "acadia_pharm_inc".into(),
            url: "https://acadia.com/en-us/media/news-releases".into(),
            article_container: Some(ContainerLocator::new("div", "results")),
            nav_button: Some("//label[contains(@class, 'show-all') and text()='Show All']".into()),
            cookie_button: Some("//button[contains(@id, 'onetrust-accept-btn-handler')]".into()),
            numeric_pagination: false,
            render_html: false,
            publisher: Publisher::Acadia,
        },
        SiteProfile {
            name: "aliada_th".into(),
            url: "https://investors.alnylam.com/press-releases".into(),
            article_container: Some(ContainerLocator::new("div", "financial-info-table")),
            nav_button: Some("//a[contains(@rel, 'next')]".into()),
            cookie_button: Some("//button[contains(@id, 'onetrust-accept-btn-handler')]".into()),
            numeric_pagination: false,
            render_html: false,
            publisher: Publisher::Aliada,
        },
        SiteProfile {
            name: "adel_inc".into(),
            url: "https://www.alzinova.com/investors/press-releases/".into(),
            article_container: Some(ContainerLocator::new("div", "mfn-content")),
            nav_button: Some(
                "//div[contains(@class, 'mfn-pagination-link') and contains(@class, 'mfn-next')]"
                    .into(),
            ),
            cookie_button: Some("//button[contains(@class, 'coi-banner__accept')]".into()),
            numeric_pagination: false,
            render_html: true,
            publisher: Publisher::Adel,
        },
        SiteProfile {
            name: "alzheon_inc".into(),
            url: "https://asceneuron.com/news-events/".into(),
            article_container: Some(ContainerLocator::new("div", "df-cpts-inner-wrap")),
            nav_button: Some("//a[contains(@class, 'df-cptfilter-load-more')]".into()),
            cookie_button: None,
            numeric_pagination: false,
            render_html: false,
            publisher: Publisher::Alzheon,
        },
        SiteProfile {
            name: "alz_research_uk".into(),
            url: "https://www.alzheimersresearchuk.org/about-us/latest/news/".into(),
            article_container: Some(ContainerLocator::new("div", "pp-content-posts")),
            nav_button: Some(
                "//span[contains(@class, 'pp-grid-loader-text') and text()='Load More']".into(),
            ),
            cookie_button: Some(
                "//button[contains(@id, 'CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll')]"
                    .into(),
            ),
            numeric_pagination: false,
            render_html: true,
            publisher: Publisher::AlzResearchUk,
        },
        SiteProfile {
            name: "cognition_ther".into(),
            url: "https://ir.cogrx.com/press-releases/".into(),
            article_container: Some(ContainerLocator::new("div", "lsc-sf-container")),
            nav_button: Some("//a[@rel='next']".into()),
            cookie_button: None,
            numeric_pagination: false,
            render_html: false,
            publisher: Publisher::CognitionTherapeutics,
        },
        SiteProfile {
            name: "gemvax_kael".into(),
            url: "https://gemvax.com/bbs/board.php?bo_table=releases_en".into(),
            article_container: Some(ContainerLocator::new("div", "bo_list")),
            nav_button: None,
            cookie_button: None,
            numeric_pagination: false,
            render_html: false,
            publisher: Publisher::GemVaxKael,
        },
        SiteProfile {
            name: "glaxosmithkline".into(),
            url: "https://us.gsk.com/en-us/media/press-releases/".into(),
            article_container: Some(ContainerLocator::new("ul", "simple-listing")),
            nav_button: Some("//a[text()='next']".into()),
            cookie_button: Some("//button[@id='preferences_prompt_submit']".into()),
            numeric_pagination: false,
            render_html: true,
            publisher: Publisher::GlaxoSmithKline,
        },
        SiteProfile {
            name: "neurim_pharma".into(),
            url: "https://neurim.com/news/".into(),
            article_container: Some(ContainerLocator::new("div", "row")),
            nav_button: Some("//a[@id='more_posts']".into()),
            cookie_button: Some("//a[@class='cc-btn cc-allow button']".into()),
            numeric_pagination: false,
            render_html: true,
            publisher: Publisher::Neurim,
        },
    ]
}
