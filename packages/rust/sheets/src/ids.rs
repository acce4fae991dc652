//! The spreadsheet id list file.

use std::path::Path;

use clubfeed_shared::{ClubfeedError, Result};

/// Read the id list at `path`.
pub fn read_spreadsheet_ids(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ClubfeedError::io(path, e))?;
    Ok(parse_spreadsheet_ids(&content))
}

/// One id per line. Whitespace and stray commas around an id are dropped,
/// as are blank lines.
pub fn parse_spreadsheet_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().trim_matches(',').trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_blank_lines() {
        let ids = parse_spreadsheet_ids("  abc123 \n\n,def456,\r\n   \n ghi789");
        assert_eq!(ids, vec!["abc123", "def456", "ghi789"]);
    }

    #[test]
    fn empty_file_has_no_ids() {
        assert!(parse_spreadsheet_ids("").is_empty());
        assert!(parse_spreadsheet_ids("\n , \n").is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_spreadsheet_ids(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ClubfeedError::Io { .. }));
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spreadsheet-ids.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        assert_eq!(read_spreadsheet_ids(&path).unwrap(), vec!["one", "two"]);
    }
}
