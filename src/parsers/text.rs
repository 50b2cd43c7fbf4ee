/// Collapses every run of whitespace into a single space and trims the ends
pub fn collapse_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins paragraph texts with single newlines, dropping empty ones
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| collapse_whitespace(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether any keyword occurs in the lower-cased text
pub fn contains_any_keyword<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k))
}

/// Splits a byline such as `By Jane Doe | Friday 25 July 2025` into author and date.
///
/// Without a `|` the whole text is taken as the date.
pub fn split_byline(text: &str) -> (Option<String>, Option<String>) {
    let text = collapse_whitespace(text);
    match text.split_once('|') {
        Some((author, date)) => {
            let author = author.trim();
            let author = if author.to_lowercase().starts_with("by ") {
                author[3..].trim()
            } else {
                author
            };
            let date = date.trim();
            (
                (!author.is_empty()).then(|| author.to_string()),
                (!date.is_empty()).then(|| date.to_string()),
            )
        }
        None => (None, (!text.is_empty()).then_some(text)),
    }
}
