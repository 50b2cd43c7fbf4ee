use crate::config::{SiteProfile, Timing};
use crate::crawlers::crawler::PageFetcher;
use crate::error::{FetchError, HarvestError};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::sleep;

/// Cached file number to the link it was fetched from
pub type UrlMap = BTreeMap<usize, String>;

/// Per-site folder of fetched article pages, `<n>.html` until renamed
#[derive(Debug, Clone)]
pub struct HtmlCache {
    dir: PathBuf,
}

impl HtmlCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, number: usize) -> PathBuf {
        self.dir.join(format!("{}.html", number))
    }

    /// Fetch every link into `<n>.html`, numbering from 1 in link order.
    ///
    /// Links that cannot be fetched on either path are skipped and leave a
    /// gap in the numbering; only the cache folder itself is fatal.
    pub async fn save_all<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &mut F,
        site: &SiteProfile,
        links: &BTreeSet<String>,
        timing: &Timing,
    ) -> Result<UrlMap, HarvestError> {
        fs::create_dir_all(&self.dir)?;
        let mut url_map = UrlMap::new();

        for (index, link) in links.iter().enumerate() {
            let number = index + 1;
            match self.save_one(fetcher, site, number, link, timing).await {
                Ok(path) => {
                    ::log::debug!("Saved {} as {}", link, path.display());
                    url_map.insert(number, link.clone());
                }
                Err(e) => ::log::warn!("Could not save HTML for {}: {}", link, e),
            }
        }

        ::log::info!(
            "{}: saved {} of {} pages to {}",
            site.name,
            url_map.len(),
            links.len(),
            self.dir.display()
        );
        Ok(url_map)
    }

    async fn save_one<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &mut F,
        site: &SiteProfile,
        number: usize,
        url: &str,
        timing: &Timing,
    ) -> Result<PathBuf, FetchError> {
        let html = fetch_page_html(fetcher, site, url, timing).await?;
        let path = self.path_for(number);
        fs::write(&path, html)?;
        Ok(path)
    }

    /// Rename a cached page to `<clean title>.html`.
    ///
    /// Returns the path the page ends up at: the original one when there is no
    /// title or the rename fails.
    pub fn rename_to_title(&self, html_path: &Path, clean_title: Option<&str>) -> PathBuf {
        let Some(title) = clean_title.filter(|t| !t.is_empty()) else {
            return html_path.to_path_buf();
        };
        let folder = html_path.parent().unwrap_or(&self.dir);
        let renamed = folder.join(format!("{}.html", title));

        match fs::rename(html_path, &renamed) {
            Ok(()) => renamed,
            Err(e) => {
                ::log::warn!(
                    "Could not rename {} to {}: {}",
                    html_path.display(),
                    renamed.display(),
                    e
                );
                html_path.to_path_buf()
            }
        }
    }
}

/// Markup of one article page: plain HTTP first unless the site needs a browser
async fn fetch_page_html<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    site: &SiteProfile,
    url: &str,
    timing: &Timing,
) -> Result<String, FetchError> {
    if !site.render_html {
        match fetcher.fetch_static(url).await {
            Ok(html) => {
                sleep(timing.page_settle()).await;
                return Ok(html);
            }
            Err(e) => ::log::debug!("Static fetch of {} failed, rendering: {}", url, e),
        }
    }

    fetcher.render(url).await?;
    sleep(timing.page_settle()).await;

    if let Some(cookie) = site.cookie_button.as_deref() {
        fetcher.dismiss_cookies(cookie).await;
    }

    // Some pages only load their text while being scrolled
    fetcher.scroll_through().await?;
    fetcher.rendered_source().await
}
