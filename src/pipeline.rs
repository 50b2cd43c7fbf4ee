use crate::cache::HtmlCache;
use crate::config::{HarvestConfig, SiteProfile};
use crate::crawlers::crawler::PageFetcher;
use crate::crawlers::discovery::{LinkDiscovery, Strategy};
use crate::error::{FetchError, HarvestError};
use crate::ledger::CheckedLedger;
use crate::output;
use crate::relevance;
use crate::results::ArticleRecord;
use crate::snapshot;
use std::fs;
use std::future::Future;

/// What one site contributed to the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub site: String,
    pub strategy: Strategy,
    pub new_links: usize,
    pub relevant: usize,
    pub records: usize,
}

/// Totals over every site of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sites: Vec<SiteReport>,
    /// Sites skipped because the browser or the base URL was unavailable
    pub failed_sites: Vec<String>,
    /// Rows in the output table after the run, including earlier runs
    pub cumulative_records: usize,
}

impl RunSummary {
    pub fn new_links(&self) -> usize {
        self.sites.iter().map(|s| s.new_links).sum()
    }

    pub fn relevant(&self) -> usize {
        self.sites.iter().map(|s| s.relevant).sum()
    }

    pub fn records(&self) -> usize {
        self.sites.iter().map(|s| s.records).sum()
    }

    pub fn log(&self) {
        ::log::info!(
            "Harvest complete: {} new links, {} keyword matches, {} rows written ({} in total)",
            self.new_links(),
            self.relevant(),
            self.records(),
            self.cumulative_records
        );
        if !self.failed_sites.is_empty() {
            ::log::warn!("Skipped sites: {}", self.failed_sites.join(", "));
        }
    }
}

/// Harvest every configured site in order, one browser session per site.
///
/// `connect` opens the session for the next site; a site whose session cannot
/// be opened, or whose processing fails, is skipped and the run moves on.
pub async fn run_sites<F, C, Fut>(
    config: &HarvestConfig,
    mut connect: C,
) -> Result<RunSummary, HarvestError>
where
    F: PageFetcher,
    C: FnMut() -> Fut,
    Fut: Future<Output = Result<F, FetchError>>,
{
    fs::create_dir_all(&config.output_dir)?;
    let mut summary = RunSummary::default();

    for site in &config.sites {
        ::log::info!("---- {} ({}) ----", site.name, site.url);

        let mut fetcher = match connect().await {
            Ok(fetcher) => fetcher,
            Err(e) => {
                let e = HarvestError::Renderer(e);
                ::log::error!("{}: {}", site.name, e);
                summary.failed_sites.push(site.name.clone());
                continue;
            }
        };

        // Re-read per site so links logged by the previous site are excluded
        let mut ledger = CheckedLedger::load_or_empty(config.ledger_path());
        let result = harvest_site(&mut fetcher, config, site, &mut ledger).await;
        fetcher.close().await;

        match result {
            Ok(report) => summary.sites.push(report),
            Err(e) => {
                ::log::error!("{}: {}", site.name, e);
                summary.failed_sites.push(site.name.clone());
            }
        }
    }

    summary.cumulative_records = output::count_records(&config.results_path()).unwrap_or_else(|e| {
        ::log::warn!("Could not count rows in {}: {}", config.results_path().display(), e);
        0
    });
    summary.log();
    Ok(summary)
}

/// Discover, cache, filter, extract and snapshot one site, then append its rows
pub async fn harvest_site<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    config: &HarvestConfig,
    site: &SiteProfile,
    ledger: &mut CheckedLedger,
) -> Result<SiteReport, HarvestError> {
    let discovered = LinkDiscovery::new(&mut *fetcher, site, ledger, config.limits, config.timing)?
        .run()
        .await?;

    let mut report = SiteReport {
        site: site.name.clone(),
        strategy: discovered.strategy,
        new_links: discovered.links.len(),
        relevant: 0,
        records: 0,
    };

    if discovered.links.is_empty() {
        ::log::info!("{}: no new article links, nothing to save", site.name);
        return Ok(report);
    }

    let cache = HtmlCache::new(config.html_dir(site));
    let url_map = cache
        .save_all(fetcher, site, &discovered.links, &config.timing)
        .await?;

    let relevant = relevance::keep_relevant(&cache, url_map, &config.keywords, ledger);
    report.relevant = relevant.len();

    let pdf_dir = config.pdf_dir(site);
    let mut records = Vec::with_capacity(relevant.len());

    for (number, url) in relevant {
        let html_path = cache.path_for(number);
        let markup = match fs::read_to_string(&html_path) {
            Ok(markup) => markup,
            Err(e) => {
                ::log::warn!("Could not read {}: {}", html_path.display(), e);
                continue;
            }
        };

        let fields = site.publisher.extract_html(&markup, &url);
        ::log::debug!("{}: extracted \"{}\"", site.name, fields.title);

        let snapshot = snapshot::capture_pdf(
            fetcher,
            &fields.url,
            &fields.title,
            &pdf_dir,
            site.cookie_button.as_deref(),
            &config.timing,
        )
        .await;

        match snapshot {
            Ok(snapshot) => {
                let html_path = cache.rename_to_title(&html_path, Some(snapshot.clean_title.as_str()));
                records.push(ArticleRecord::new(
                    fields,
                    html_path.display().to_string(),
                    snapshot.pdf_path.display().to_string(),
                ));
            }
            Err(failure) if config.keep_failed_snapshots => {
                ::log::warn!("{}: snapshot of {} failed: {}", site.name, url, failure);
                records.push(ArticleRecord::new(
                    fields,
                    html_path.display().to_string(),
                    failure.to_string(),
                ));
            }
            Err(failure) => {
                ::log::warn!("{}: snapshot of {} failed, row dropped: {}", site.name, url, failure);
            }
        }
    }

    report.records = output::append_records(&config.results_path(), &records)?;
    ::log::info!(
        "{}: {} links, {} relevant, {} rows",
        site.name,
        report.new_links,
        report.relevant,
        report.records
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContainerLocator, Timing};
    use crate::crawlers::tests::{MockFetcher, listing};
    use crate::extractors::Publisher;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    const BASE: &str = "https://asceneuron.com/news-events/";
    const MATCH: &str = "https://asceneuron.com/news/trial";
    const OTHER: &str = "https://asceneuron.com/news/earnings";

    const MATCH_PAGE: &str = r#"<html><body>
        <h1 class="entry-title">Phase 2 Trial in Alzheimer's Disease</h1>
        <span class="published">Jan 6, 2025</span>
        <div class="et_pb_text_inner"><p>First paragraph.</p><p>Second paragraph.</p></div>
    </body></html>"#;

    const OTHER_PAGE: &str = r#"<html><body>
        <h1 class="entry-title">Quarterly earnings</h1>
    </body></html>"#;

    fn config(output_dir: &Path) -> HarvestConfig {
        HarvestConfig {
            output_dir: output_dir.to_path_buf(),
            timing: Timing::immediate(),
            sites: vec![SiteProfile {
                name: "alzheon_inc".into(),
                url: BASE.into(),
                article_container: Some(ContainerLocator::new("div", "list")),
                nav_button: None,
                cookie_button: None,
                numeric_pagination: false,
                render_html: false,
                publisher: Publisher::Alzheon,
            }],
            ..HarvestConfig::default()
        }
    }

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(20, 10))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn fetcher(screenshot: Option<Vec<u8>>) -> MockFetcher {
        let mut fetcher = MockFetcher::new()
            .with_static(BASE, listing(&[MATCH, OTHER]))
            .with_static(MATCH, MATCH_PAGE.into())
            .with_static(OTHER, OTHER_PAGE.into())
            .with_rendered(MATCH, MATCH_PAGE.into());
        fetcher.screenshot = screenshot;
        fetcher
    }

    #[tokio::test]
    async fn test_site_harvest_writes_matching_articles() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let site = &config.sites[0];
        let mut ledger = CheckedLedger::load(config.ledger_path()).unwrap();
        let mut fetcher = fetcher(Some(png()));

        let report = harvest_site(&mut fetcher, &config, site, &mut ledger)
            .await
            .unwrap();

        assert_eq!(report.strategy, Strategy::HomePage);
        assert_eq!(report.new_links, 2);
        assert_eq!(report.relevant, 1);
        assert_eq!(report.records, 1);

        let records = output::read_records(&config.results_path()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.publisher, "Alzheon Inc.");
        assert_eq!(record.title, "Phase 2 Trial in Alzheimer's Disease");
        assert_eq!(record.url, MATCH);
        assert_eq!(record.publish_date, "Jan 6, 2025");
        assert_eq!(record.authors, "N/A");
        assert_eq!(record.body, "First paragraph.\nSecond paragraph.");
        assert!(record.has_snapshot());
        assert!(record.html_path.ends_with("Phase_2_Trial_in_Alzheimer's_Disease.html"));
        assert!(Path::new(&record.html_path).exists());
        assert!(Path::new(&record.pdf_path).exists());

        // Both pages were scanned, so neither is fetched again next time
        let reloaded = CheckedLedger::load(config.ledger_path()).unwrap();
        assert!(reloaded.contains(MATCH));
        assert!(reloaded.contains(OTHER));

        let mut again = MockFetcher::new().with_static(BASE, listing(&[MATCH, OTHER]));
        let report = harvest_site(&mut again, &config, site, &mut ledger)
            .await
            .unwrap();
        assert_eq!(report.new_links, 0);
        assert_eq!(output::count_records(&config.results_path()).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_snapshot_drops_row_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut ledger = CheckedLedger::load(config.ledger_path()).unwrap();
        let mut fetcher = fetcher(None);

        let report = harvest_site(&mut fetcher, &config, &config.sites[0], &mut ledger)
            .await
            .unwrap();

        assert_eq!(report.relevant, 1);
        assert_eq!(report.records, 0);
        assert!(!config.results_path().exists());
    }

    #[tokio::test]
    async fn test_failed_snapshot_kept_with_sentinel_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.keep_failed_snapshots = true;
        let mut ledger = CheckedLedger::load(config.ledger_path()).unwrap();
        let mut fetcher = fetcher(None);

        harvest_site(&mut fetcher, &config, &config.sites[0], &mut ledger)
            .await
            .unwrap();

        let records = output::read_records(&config.results_path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pdf_path, "Screenshot failed");
        // Cache files follow sorted link order: earnings is 1, trial is 2
        assert!(records[0].html_path.ends_with("2.html"));
    }

    #[tokio::test]
    async fn test_run_skips_sites_that_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        let mut unreachable = config.sites[0].clone();
        unreachable.name = "unreachable".into();
        unreachable.url = "https://down.example.com/".into();
        config.sites.insert(0, unreachable);

        let mut attempts = 0;
        let summary = run_sites(&config, || {
            attempts += 1;
            let result = if attempts == 1 {
                Err(FetchError::Timeout("session".into()))
            } else {
                Ok(fetcher(Some(png())))
            };
            async move { result }
        })
        .await
        .unwrap();

        assert_eq!(summary.failed_sites, vec!["unreachable".to_string()]);
        assert_eq!(summary.sites.len(), 1);
        assert_eq!(summary.relevant(), 1);
        assert_eq!(summary.cumulative_records, 1);
    }

    #[tokio::test]
    async fn test_unreachable_site_is_closed_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        let mut unreachable = config.sites[0].clone();
        unreachable.name = "unreachable".into();
        unreachable.url = "https://down.example.com/".into();
        config.sites.insert(0, unreachable);

        let closed = [Arc::new(AtomicBool::new(false)), Arc::new(AtomicBool::new(false))];
        let mut sessions = vec![
            // Serves nothing, so the base URL fails on every backend
            MockFetcher::new().with_close_flag(closed[0].clone()),
            fetcher(Some(png())).with_close_flag(closed[1].clone()),
        ]
        .into_iter();

        let summary = run_sites(&config, || {
            let next = sessions
                .next()
                .ok_or_else(|| FetchError::Script("no session left".into()));
            async move { next }
        })
        .await
        .unwrap();

        assert!(closed[0].load(Ordering::SeqCst));
        assert!(closed[1].load(Ordering::SeqCst));
        assert_eq!(summary.failed_sites, vec!["unreachable".to_string()]);
        assert_eq!(summary.sites.len(), 1);
        assert_eq!(summary.sites[0].site, "alzheon_inc");
        assert_eq!(summary.records(), 1);
        assert_eq!(output::count_records(&config.results_path()).unwrap(), 1);
    }
}
