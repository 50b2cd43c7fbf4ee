use serde::{Deserialize, Serialize};

/// Value written for any field the page does not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Fields read from a stored article page by a publisher extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFields {
    pub publisher: String,
    pub title: String,
    pub url: String,
    pub publish_date: String,
    pub authors: String,
    pub body: String,
}

/// One row of the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "PUBLISHER")]
    pub publisher: String,

    #[serde(rename = "TITLE")]
    pub title: String,

    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "PUBLISH DATE")]
    pub publish_date: String,

    #[serde(rename = "AUTHOR(S)")]
    pub authors: String,

    #[serde(rename = "HTML PATH")]
    pub html_path: String,

    /// Snapshot file, or the name of the step that failed
    #[serde(rename = "PDF PATH")]
    pub pdf_path: String,

    #[serde(rename = "BODY")]
    pub body: String,
}

impl ArticleRecord {
    /// Create a record from extracted fields and the paths produced for them
    pub fn new(fields: ArticleFields, html_path: String, pdf_path: String) -> Self {
        Self {
            publisher: fields.publisher,
            title: fields.title,
            url: fields.url,
            publish_date: fields.publish_date,
            authors: fields.authors,
            html_path,
            pdf_path,
            body: fields.body,
        }
    }

    /// Whether a snapshot file was actually written
    pub fn has_snapshot(&self) -> bool {
        self.pdf_path.to_lowercase().ends_with(".pdf")
    }
}
