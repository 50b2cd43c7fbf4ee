use crate::cache::{HtmlCache, UrlMap};
use crate::ledger::CheckedLedger;
use crate::parsers::{html, text};
use std::fs;
use std::path::Path;

/// Keep the cached pages whose visible text mentions a keyword.
///
/// Every page whose text could be read is written to the ledger whatever the
/// outcome, so later runs never fetch it again. Pages without a keyword, and
/// pages that cannot be read, are deleted and dropped from the returned map.
pub fn keep_relevant<S: AsRef<str>>(
    cache: &HtmlCache,
    url_map: UrlMap,
    keywords: &[S],
    ledger: &mut CheckedLedger,
) -> UrlMap {
    let scanned = url_map.len();
    let mut relevant = UrlMap::new();

    for (number, url) in url_map {
        let path = cache.path_for(number);

        let page_text = match fs::read_to_string(&path) {
            Ok(markup) => html::visible_text(&markup),
            Err(e) => {
                ::log::warn!("Could not read {} for keyword scan: {}", path.display(), e);
                log_checked(ledger, &url);
                discard(&path);
                continue;
            }
        };

        log_checked(ledger, &url);

        if text::contains_any_keyword(&page_text, keywords) {
            ::log::debug!("Keyword found in {}", url);
            relevant.insert(number, url);
        } else {
            ::log::debug!("No keyword in {}, deleting {}", url, path.display());
            discard(&path);
        }
    }

    ::log::info!("{} of {} pages matched the keywords", relevant.len(), scanned);
    relevant
}

fn log_checked(ledger: &mut CheckedLedger, url: &str) {
    if let Err(e) = ledger.record(url) {
        ::log::error!("Failed to log checked link {}: {}", url, e);
    }
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            ::log::warn!("Could not delete {}: {}", path.display(), e);
        }
    }
}
