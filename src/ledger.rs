use crate::error::HarvestError;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Durable record of URLs already scanned for keywords.
///
/// Stored as a one-column CSV without a header, one URL per row. The file is
/// only ever appended to, and a URL is written at most once.
#[derive(Debug)]
pub struct CheckedLedger {
    path: PathBuf,
    links: HashSet<String>,
}

impl CheckedLedger {
    /// Read the ledger at `path`; a missing file is an empty ledger
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref().to_path_buf();
        let mut links = HashSet::new();

        if path.exists() {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)?;
            for record in reader.records() {
                let record = record?;
                if let Some(url) = record.get(0).map(str::trim).filter(|u| !u.is_empty()) {
                    links.insert(url.to_string());
                }
            }
        }

        ::log::debug!("Loaded {} checked links from {}", links.len(), path.display());
        Ok(Self { path, links })
    }

    /// Load, logging and starting empty if the file is unreadable
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(ledger) => ledger,
            Err(e) => {
                ::log::error!("Failed to read checked links from {}: {}", path.display(), e);
                Self {
                    path: path.to_path_buf(),
                    links: HashSet::new(),
                }
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.links.contains(url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `url` unless it is already recorded. Returns whether a row was written.
    pub fn record(&mut self, url: &str) -> Result<bool, HarvestError> {
        if self.links.contains(url) {
            return Ok(false);
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([url])?;
        writer.flush()?;

        self.links.insert(url.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CheckedLedger::load(dir.path().join("checked_links.csv")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_is_idempotent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("checked_links.csv");

        let mut ledger = CheckedLedger::load(&path).unwrap();
        assert!(ledger.record("https://example.com/a").unwrap());
        assert!(!ledger.record("https://example.com/a").unwrap());
        assert!(ledger.record("https://example.com/b?x=1,2").unwrap());

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        // A later run sees the same set and still refuses duplicates
        let mut reloaded = CheckedLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://example.com/a"));
        assert!(reloaded.contains("https://example.com/b?x=1,2"));
        assert!(!reloaded.record("https://example.com/a").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
