use crate::config::{PaginationLimits, SiteProfile, Timing};
use crate::crawlers::crawler::PageFetcher;
use crate::error::{FetchError, HarvestError};
use crate::filter::UrlFilter;
use crate::ledger::CheckedLedger;
use crate::parsers::html;
use crate::utils::numeric_page_url;
use std::collections::BTreeSet;
use std::fmt;
use tokio::time::sleep;
use url::Url;

/// One way of turning a page URL into hrefs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBackend {
    /// Plain HTTP GET and parse
    Static,
    /// Navigate the browser and parse the rendered DOM
    Rendered,
}

/// Backends in the order they are tried; a later one only runs when the
/// earlier ones produced no links.
pub const BACKEND_CHAIN: [LinkBackend; 2] = [LinkBackend::Static, LinkBackend::Rendered];

/// Which discovery phase produced a site's link set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NumericPagination,
    ButtonPagination,
    HomePage,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::NumericPagination => write!(f, "numeric pagination"),
            Strategy::ButtonPagination => write!(f, "button pagination"),
            Strategy::HomePage => write!(f, "home page"),
        }
    }
}

/// Unvisited, in-domain article links for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub links: BTreeSet<String>,
    pub strategy: Strategy,
}

/// Pagination state machine for a single site.
///
/// Phases run in a fixed order (numeric, button, home page) and a later phase
/// only runs when the earlier ones produced nothing.
pub struct LinkDiscovery<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a mut F,
    site: &'a SiteProfile,
    ledger: &'a CheckedLedger,
    limits: PaginationLimits,
    timing: Timing,
    filter: UrlFilter,
    base_url: Url,
}

impl<'a, F: PageFetcher + ?Sized> LinkDiscovery<'a, F> {
    pub fn new(
        fetcher: &'a mut F,
        site: &'a SiteProfile,
        ledger: &'a CheckedLedger,
        limits: PaginationLimits,
        timing: Timing,
    ) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&site.url).map_err(|e| {
            HarvestError::Config(format!("site {} has an invalid url: {}", site.name, e))
        })?;
        let filter = UrlFilter::for_base(&base_url);

        Ok(Self {
            fetcher,
            site,
            ledger,
            limits,
            timing,
            filter,
            base_url,
        })
    }

    /// Run the phases in priority order and return the first non-empty result.
    ///
    /// Only the home-page fallback can fail: when the base URL cannot be
    /// fetched on any backend the site is unreachable.
    pub async fn run(&mut self) -> Result<Discovered, HarvestError> {
        let site = self.site;
        ::log::info!("Discovering links for {} from {}", site.name, site.url);

        if site.numeric_pagination {
            if let Some(links) = self.numeric_pages().await {
                return Ok(self.finish(links, Strategy::NumericPagination));
            }
            ::log::info!("{}: numeric pagination found nothing", site.name);
        }

        if let Some(nav) = site.nav_button.as_deref() {
            let links = self.button_pages(nav).await;
            if !links.is_empty() {
                return Ok(self.finish(links, Strategy::ButtonPagination));
            }
            ::log::info!("{}: button pagination found nothing", site.name);
        }

        let links = self.home_page().await?;
        Ok(self.finish(links, Strategy::HomePage))
    }

    fn finish(&self, links: BTreeSet<String>, strategy: Strategy) -> Discovered {
        ::log::info!(
            "{}: {} new links via {}",
            self.site.name,
            links.len(),
            strategy
        );
        Discovered { links, strategy }
    }

    /// `page=N` requests after the base page.
    ///
    /// `None` when no request contributed a new link; whatever the base page
    /// yielded is discarded with it.
    pub async fn numeric_pages(&mut self) -> Option<BTreeSet<String>> {
        let base = self.site.url.clone();
        let mut links = BTreeSet::new();

        match self.page_links(&base).await {
            Ok(found) => {
                let new = self.fresh(found, &links);
                ::log::debug!("{}: base page gave {} links", self.site.name, new.len());
                links.extend(new);
            }
            Err(e) => ::log::warn!("Failed to fetch {}: {}", base, e),
        }

        let mut empty_pages = 0;
        let mut contributed = false;

        for page in 0..self.limits.max_numeric_pages {
            let url = numeric_page_url(&base, page);
            let new = match self.page_links(&url).await {
                Ok(found) => self.fresh(found, &links),
                Err(e) => {
                    ::log::warn!("Failed to fetch {}: {}", url, e);
                    BTreeSet::new()
                }
            };

            if new.is_empty() {
                empty_pages += 1;
                ::log::debug!(
                    "{}: no new links on page {} ({}/{})",
                    self.site.name,
                    page,
                    empty_pages,
                    self.limits.empty_page_limit
                );
                if empty_pages >= self.limits.empty_page_limit {
                    break;
                }
            } else {
                ::log::debug!("{}: page {} gave {} new links", self.site.name, page, new.len());
                empty_pages = 0;
                contributed = true;
                links.extend(new);
            }
        }

        if contributed { Some(links) } else { None }
    }

    /// Click the site's "next"/"load more" control until the page stops yielding links
    pub async fn button_pages(&mut self, nav_xpath: &str) -> BTreeSet<String> {
        let base = self.site.url.clone();
        let mut links = BTreeSet::new();

        if let Err(e) = self.fetcher.render(&base).await {
            ::log::warn!("Failed to load {} in the browser: {}", base, e);
            return links;
        }
        sleep(self.timing.page_settle()).await;

        let mut last_url = self.fetcher.current_url().await.unwrap_or_else(|_| base.clone());
        let mut single_link_runs = 0;
        let mut no_new_link_runs = 0;
        let mut clicks = 0;

        loop {
            let current_url = self
                .fetcher
                .current_url()
                .await
                .unwrap_or_else(|_| last_url.clone());

            // After a navigating click, links come from the rendered page only
            let found = if current_url != last_url {
                ::log::debug!("{}: navigated to {}", self.site.name, current_url);
                let rendered = self
                    .backend_links(LinkBackend::Rendered, &current_url)
                    .await;
                last_url = self
                    .fetcher
                    .current_url()
                    .await
                    .unwrap_or_else(|_| current_url.clone());
                rendered
            } else {
                self.dom_links(&current_url).await
            };

            let new = match found {
                Ok(found) => self.fresh(found, &links),
                Err(e) => {
                    ::log::warn!("Failed to read links from {}: {}", current_url, e);
                    BTreeSet::new()
                }
            };

            match new.len() {
                0 => {
                    no_new_link_runs += 1;
                    single_link_runs = 0;
                }
                1 => {
                    single_link_runs += 1;
                    no_new_link_runs = 0;
                }
                _ => {
                    single_link_runs = 0;
                    no_new_link_runs = 0;
                }
            }
            ::log::debug!(
                "{}: {} new links after {} clicks",
                self.site.name,
                new.len(),
                clicks
            );
            links.extend(new);

            // A widget that keeps offering one "related" link is not pagination
            if single_link_runs >= self.limits.single_link_limit {
                ::log::info!("{}: only single new links, stopping", self.site.name);
                break;
            }
            if no_new_link_runs >= self.limits.no_new_link_limit {
                ::log::info!("{}: no new links, stopping", self.site.name);
                break;
            }
            if clicks >= self.limits.max_clicks {
                ::log::info!("{}: reached {} clicks, stopping", self.site.name, clicks);
                break;
            }

            match self.fetcher.click_control(nav_xpath).await {
                Ok(true) => {
                    clicks += 1;
                    sleep(self.timing.click_delay()).await;
                }
                Ok(false) => {
                    ::log::info!("{}: pagination control not found, stopping", self.site.name);
                    break;
                }
                Err(e) => {
                    ::log::warn!("{}: pagination click failed: {}", self.site.name, e);
                }
            }
        }

        links
    }

    /// The base URL as the only listing page
    pub async fn home_page(&mut self) -> Result<BTreeSet<String>, HarvestError> {
        let base = self.site.url.clone();
        match self.page_links(&base).await {
            Ok(found) => Ok(self.fresh(found, &BTreeSet::new())),
            Err(source) => {
                ::log::error!("{}: base URL unreachable: {}", self.site.name, source);
                Err(HarvestError::Unreachable {
                    site: self.site.name.clone(),
                    source,
                })
            }
        }
    }

    /// In-domain links of `url`, walking the backend chain.
    ///
    /// Fails only when every backend failed; a backend that answered with no
    /// links lets the next one try but does not make the page an error.
    pub async fn page_links(&mut self, url: &str) -> Result<BTreeSet<String>, FetchError> {
        let mut last_error = None;
        let mut answered = false;

        for backend in BACKEND_CHAIN {
            match self.backend_links(backend, url).await {
                Ok(links) if !links.is_empty() => {
                    return Ok(self.in_domain(links));
                }
                Ok(_) => {
                    ::log::debug!("{:?} backend found no links on {}", backend, url);
                    answered = true;
                }
                Err(e) => {
                    ::log::debug!("{:?} backend failed on {}: {}", backend, url, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(BTreeSet::new()),
        }
    }

    /// Post-filtered links from one backend. The domain check happens after the chain.
    pub async fn backend_links(
        &mut self,
        backend: LinkBackend,
        url: &str,
    ) -> Result<BTreeSet<String>, FetchError> {
        let container = self.site.article_container.as_ref();
        match backend {
            LinkBackend::Static => {
                let body = self.fetcher.fetch_static(url).await?;
                sleep(self.timing.request_delay()).await;
                Ok(self.filter.post_filter(html::extract_links(&body, container, None)))
            }
            LinkBackend::Rendered => {
                self.fetcher.render(url).await?;
                sleep(self.timing.page_settle()).await;
                let page_url = self.fetcher.current_url().await.unwrap_or_else(|_| url.to_string());
                self.dom_links(&page_url).await
            }
        }
    }

    /// Post-filtered links of the DOM the browser is showing, without navigating
    async fn dom_links(&mut self, page_url: &str) -> Result<BTreeSet<String>, FetchError> {
        let source = self.fetcher.rendered_source().await?;
        let resolve_against = Url::parse(page_url).unwrap_or_else(|_| self.base_url.clone());
        let hrefs = html::extract_links(
            &source,
            self.site.article_container.as_ref(),
            Some(&resolve_against),
        );
        Ok(self.filter.filter_links(hrefs))
    }

    fn in_domain(&self, links: BTreeSet<String>) -> BTreeSet<String> {
        links
            .into_iter()
            .filter(|link| self.filter.is_in_domain(link))
            .collect()
    }

    /// Links not already accumulated and not scanned in an earlier run
    fn fresh(&self, found: BTreeSet<String>, accumulated: &BTreeSet<String>) -> BTreeSet<String> {
        found
            .into_iter()
            .filter(|link| !accumulated.contains(link) && !self.ledger.contains(link))
            .collect()
    }
}
