//! Input list reading
//!
//! The input is a CSV file whose first row is a header. Each following row
//! holds a URL in the first column and an optional description in the second;
//! further columns are ignored. Row order is processing order.

use crate::error::{Error, Result};
use crate::types::UrlEntry;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Read all entries from a CSV file
pub fn read_entries(path: &Path) -> Result<Vec<UrlEntry>> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::Other(format!(
            "failed to open input list {}: {}",
            path.display(),
            e
        ))
    })?;
    let entries = parse_entries(file)?;
    debug!(path = ?path, count = entries.len(), "loaded input list");
    Ok(entries)
}

/// Parse entries from any CSV source
///
/// Rows with an empty URL cell are skipped with a warning.
pub fn parse_entries<R: Read>(source: R) -> Result<Vec<UrlEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut entries = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let url = record.get(0).unwrap_or_default();
        if url.is_empty() {
            // +2: header row and 1-based numbering
            warn!(row = row + 2, "skipping input row without URL");
            continue;
        }
        let description = record.get(1).unwrap_or_default();
        entries.push(UrlEntry::new(url, description));
    }

    Ok(entries)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_header_and_keeps_order() {
        let csv = "url,description\nhttps://b.example.com,second\nhttps://a.example.com,first\n";
        let entries = parse_entries(csv.as_bytes()).unwrap();

        assert_eq!(
            entries,
            vec![
                UrlEntry::new("https://b.example.com", "second"),
                UrlEntry::new("https://a.example.com", "first"),
            ]
        );
    }

    #[test]
    fn test_parse_defaults_missing_description() {
        let csv = "url\nhttps://example.com\nhttps://example.org,,extra,columns\n";
        let entries = parse_entries(csv.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "");
        assert_eq!(entries[1].url, "https://example.org");
        assert_eq!(entries[1].description, "");
    }

    #[test]
    fn test_parse_skips_rows_without_url() {
        let csv = "url,description\n,orphan label\n  https://example.com  , home \n";
        let entries = parse_entries(csv.as_bytes()).unwrap();

        assert_eq!(entries, vec![UrlEntry::new("https://example.com", "home")]);
    }

    #[test]
    fn test_parse_quoted_description() {
        let csv = "url,description\nhttps://example.com,\"Home, logged out\"\n";
        let entries = parse_entries(csv.as_bytes()).unwrap();

        assert_eq!(entries[0].description, "Home, logged out");
    }

    #[test]
    fn test_header_only_is_empty() {
        let entries = parse_entries("url,description\n".as_bytes()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_read_entries_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url,description").unwrap();
        writeln!(file, "https://example.com,home").unwrap();

        let entries = read_entries(file.path()).unwrap();
        assert_eq!(entries, vec![UrlEntry::new("https://example.com", "home")]);
    }

    #[test]
    fn test_read_entries_missing_file() {
        let result = read_entries(Path::new("/nonexistent/urls.csv"));
        assert!(matches!(result, Err(Error::Other(msg)) if msg.contains("failed to open")));
    }
}
