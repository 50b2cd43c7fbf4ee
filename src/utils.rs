use chrono::{DateTime, Local};

/// Longest title prefix used for file names
pub const MAX_TITLE_CHARS: usize = 60;

/// URL of the `page=N` request for a listing page
pub fn numeric_page_url(base_url: &str, page: usize) -> String {
    if base_url.contains('?') {
        format!("{}&page={}", base_url, page)
    } else {
        format!("{}?page={}", base_url, page)
    }
}

/// Convert an article title to a file stem.
///
/// Keeps the first [`MAX_TITLE_CHARS`] characters, drops characters that are
/// illegal in file names, trims, and replaces spaces with underscores.
pub fn sanitize_filename(title: &str) -> String {
    let prefix = title.chars().take(MAX_TITLE_CHARS).collect::<String>();
    prefix
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// File stem used when an article has no usable title, e.g. `webpage_0718_142501`
pub fn timestamp_stem(now: DateTime<Local>) -> String {
    format!("webpage_{}", now.format("%m%d_%H%M%S"))
}
