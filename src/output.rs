use crate::error::HarvestError;
use crate::results::ArticleRecord;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Append records to the output table, writing the header only into a new or empty file.
pub fn append_records(path: &Path, records: &[ArticleRecord]) -> Result<usize, HarvestError> {
    if records.is_empty() {
        return Ok(0);
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    ::log::info!("Saved {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Number of data rows in the output table; 0 when it does not exist
pub fn count_records(path: &Path) -> Result<usize, HarvestError> {
    if !path.exists() {
        return Ok(0);
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut count = 0;
    for record in reader.records() {
        record?;
        count += 1;
    }
    Ok(count)
}

/// Read every record back; used for summaries and tests
pub fn read_records(path: &Path) -> Result<Vec<ArticleRecord>, HarvestError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> ArticleRecord {
        ArticleRecord {
            publisher: "Alzheon Inc.".into(),
            title: title.into(),
            url: format!("https://asceneuron.com/{}", title),
            publish_date: "Jan 6, 2025".into(),
            authors: "N/A".into(),
            html_path: format!("saved_sites/alzheon_inc_htmls/{}.html", title),
            pdf_path: format!("saved_sites/alzheon_inc_pdfs/{}.pdf", title),
            body: "Line one\nLine, two".into(),
        }
    }

    #[test]
    fn test_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alz_articles.csv");

        assert_eq!(append_records(&path, &[record("a")]).unwrap(), 1);
        assert_eq!(append_records(&path, &[record("b"), record("c")]).unwrap(), 2);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "PUBLISHER,TITLE,URL,PUBLISH DATE,AUTHOR(S),HTML PATH,PDF PATH,BODY"
        ));
        assert_eq!(contents.matches("PUBLISHER").count(), 1);

        assert_eq!(count_records(&path).unwrap(), 3);
        let records = read_records(&path).unwrap();
        assert_eq!(records[2], record("c"));
        assert_eq!(records[0].body, "Line one\nLine, two");
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alz_articles.csv");
        assert_eq!(append_records(&path, &[]).unwrap(), 0);
        assert!(!path.exists());
        assert_eq!(count_records(&path).unwrap(), 0);
    }
}
