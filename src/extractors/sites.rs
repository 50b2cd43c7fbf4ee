use super::FieldLookups;
use crate::parsers::html::{element_text, first_text, paragraph_texts, paragraphs_in};
use crate::parsers::text::{join_paragraphs, split_byline};
use scraper::{Html, Selector};

fn body_from(paragraphs: Vec<String>) -> Option<String> {
    let body = join_paragraphs(&paragraphs);
    (!body.is_empty()).then_some(body)
}

// No bylines on the ACADIA newsroom
pub(super) fn acadia(doc: &Html) -> FieldLookups {
    FieldLookups {
        title: first_text(doc, "h1[data-astro-cid-u4qoyrkz]").or_else(|| first_text(doc, "h1")),
        publish_date: first_text(doc, "span.text[data-astro-cid-ijeeojtv]"),
        authors: None,
        body: body_from(paragraph_texts(doc, "article")),
    }
}

pub(super) fn aliada(doc: &Html) -> FieldLookups {
    FieldLookups {
        title: first_text(doc, "h2.press-d-title, h2.mt-0"),
        publish_date: first_text(doc, "p.event-date"),
        authors: None,
        body: body_from(paragraph_texts(doc, "div.col-sm-9")),
    }
}

pub(super) fn adel(doc: &Html) -> FieldLookups {
    let body = Selector::parse(".mfn-body")
        .ok()
        .and_then(|s| doc.select(&s).next())
        .map(|block| paragraphs_in(&block))
        .and_then(body_from);

    FieldLookups {
        title: first_text(doc, ".mfn-title"),
        publish_date: first_text(doc, ".mfn-date"),
        authors: None,
        body,
    }
}

pub(super) fn alzheon(doc: &Html) -> FieldLookups {
    FieldLookups {
        title: first_text(doc, "h1.entry-title"),
        publish_date: first_text(doc, "span.published"),
        authors: first_text(doc, "span.author.vcard"),
        body: body_from(paragraph_texts(doc, "div.et_pb_text_inner")),
    }
}

/// Byline paragraphs look like `By Alzheimer's Research UK | Friday 25 July 2025`.
pub(super) fn alz_research_uk(doc: &Html) -> FieldLookups {
    let mut authors = None;
    let mut publish_date = None;

    if let (Ok(blocks), Ok(p)) = (Selector::parse("div.fl-rich-text"), Selector::parse("p")) {
        for block in doc.select(&blocks) {
            let Some(first_p) = block.select(&p).next() else {
                continue;
            };
            let text = element_text(&first_p);
            if text.contains('|') || text.to_lowercase().contains("by ") {
                (authors, publish_date) = split_byline(&text);
                break;
            }
        }
    }

    FieldLookups {
        title: first_text(doc, "h1.fl-heading"),
        publish_date,
        authors,
        body: body_from(paragraph_texts(doc, "div.fl-module-content.fl-node-content")),
    }
}

/// The body is the widget container that also carries the date line.
pub(super) fn cognition(doc: &Html) -> FieldLookups {
    let body = match (
        Selector::parse("div.elementor-widget-container"),
        Selector::parse("div.pr-date-globe"),
    ) {
        (Ok(containers), Ok(date)) => doc
            .select(&containers)
            .find(|c| c.select(&date).next().is_some())
            .map(|c| paragraphs_in(&c))
            .and_then(body_from),
        _ => None,
    };

    FieldLookups {
        title: first_text(doc, "h1.elementor-heading-title.elementor-size-default"),
        publish_date: first_text(doc, "div.pr-date-globe"),
        authors: None,
        body,
    }
}

/// Korean board software: the date cell is prefixed with "작성일" and English
/// text sits in `span[lang=EN-US]` next to the Korean original.
pub(super) fn gemvax(doc: &Html) -> FieldLookups {
    let publish_date = first_text(doc, "strong.if_date")
        .map(|d| d.replace("작성일", "").trim().to_string())
        .filter(|d| !d.is_empty());

    let body = match (
        Selector::parse("div.r-sub-con"),
        Selector::parse("p"),
        Selector::parse(r#"span[lang="EN-US"]"#),
    ) {
        (Ok(container), Ok(p), Ok(english)) => doc.select(&container).next().and_then(|block| {
            let texts = block
                .select(&p)
                .filter_map(|para| {
                    para.select(&english)
                        .map(|span| element_text(&span))
                        .find(|t| !t.is_empty())
                        .or_else(|| Some(element_text(&para)))
                })
                .collect::<Vec<_>>();
            body_from(texts)
        }),
        _ => None,
    };

    FieldLookups {
        title: first_text(doc, "span.bo_v_tit"),
        publish_date,
        authors: None,
        body,
    }
}

pub(super) fn gsk(doc: &Html) -> FieldLookups {
    let primary = paragraph_texts(doc, "div.main-container.rte.child-component");
    let paragraphs = if primary.is_empty() {
        paragraph_texts(doc, "div.content-wrapper")
    } else {
        primary
    };

    FieldLookups {
        title: first_text(doc, "span.bo_v_tit").or_else(|| first_text(doc, "h1")),
        publish_date: first_text(doc, "strong.if_date"),
        authors: None,
        body: body_from(paragraphs),
    }
}

pub(super) fn neurim(doc: &Html) -> FieldLookups {
    FieldLookups {
        title: first_text(doc, "h2"),
        publish_date: first_text(doc, "div.card-date.date"),
        authors: None,
        body: body_from(paragraph_texts(doc, "div.blog-detail-post")),
    }
}
