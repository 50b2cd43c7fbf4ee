use crate::config::ContainerLocator;
use crate::parsers::text;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the reader
const INVISIBLE: [&str; 4] = ["script", "style", "noscript", "template"];

/// Collects the `href` of every anchor inside the site's article container.
///
/// When the container is not configured, cannot be parsed as a selector, or
/// is absent from the page, the whole document is searched. With `resolve_against`
/// set, relative hrefs are made absolute the way a browser's `href` property
/// reports them; otherwise hrefs are returned exactly as written.
pub fn extract_links(
    html: &str,
    container: Option<&ContainerLocator>,
    resolve_against: Option<&Url>,
) -> Vec<String> {
    let doc = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let scope = container.and_then(|locator| find_container(&doc, locator));
    let hrefs: Vec<&str> = match scope {
        Some(element) => element
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .collect(),
        None => doc
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .collect(),
    };

    let links = hrefs
        .into_iter()
        .filter_map(|href| match resolve_against {
            Some(base) => base.join(href.trim()).ok().map(|u| u.to_string()),
            None => Some(href.trim().to_string()),
        })
        .collect::<Vec<_>>();

    ::log::debug!(
        "HTML parser found {} links (container {})",
        links.len(),
        if scope.is_some() { "found" } else { "not used" }
    );

    links
}

/// First element matching the container locator that holds at least one link,
/// falling back to the first match at all.
fn find_container<'a>(doc: &'a Html, locator: &ContainerLocator) -> Option<ElementRef<'a>> {
    let selector = match Selector::parse(&locator.css()) {
        Ok(selector) => selector,
        Err(e) => {
            ::log::warn!("Container locator {:?} is not a valid selector: {:?}", locator, e);
            return None;
        }
    };
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let mut candidates = doc.select(&selector).peekable();
    let first = candidates.peek().copied();
    candidates
        .find(|element| element.select(&anchor_selector).next().is_some())
        .or(first)
}

/// Text a reader would see: every text node outside script/style, whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut pieces = Vec::new();

    for node in doc.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| INVISIBLE.contains(&e.name()))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }

    text::collapse_whitespace(&pieces.join(" "))
}

/// Whitespace-collapsed text of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    text::collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element matching `css`, if any and non-empty
pub fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
}

/// Non-empty texts of every `<p>` below the elements matching `css`, in document order
pub fn paragraph_texts(doc: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    doc.select(&selector)
        .flat_map(|block| paragraphs_in(&block))
        .collect()
}

/// Non-empty texts of every `<p>` below one element
pub fn paragraphs_in(element: &ElementRef<'_>) -> Vec<String> {
    let p_selector = Selector::parse("p").unwrap();
    element
        .select(&p_selector)
        .map(|p| element_text(&p))
        .filter(|t| !t.is_empty())
        .collect()
}
