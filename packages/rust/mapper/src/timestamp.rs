//! Submission timestamps → record ids and version stamps.
//!
//! Form timestamps arrive as `D/M/Y H:M:S`. Records are keyed year-first so
//! ids sort by submission time within a spreadsheet.

use std::sync::LazyLock;

use regex::Regex;

use crate::MapError;

/// Separators between timestamp tokens.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/:\s]+").expect("separator regex"));

/// The six timestamp tokens, reordered year-first and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStamp {
    /// Year, month, day, hour, minute, second.
    tokens: [String; 6],
    modified: u64,
}

impl SubmissionStamp {
    /// Parse a `D/M/Y H:M:S` cell. Tokens past the sixth are ignored.
    pub fn parse(raw: &str) -> Result<Self, MapError> {
        let malformed = || MapError::MalformedTimestamp {
            raw: raw.to_string(),
        };

        let parts: Vec<&str> = SEPARATORS
            .split(raw.trim())
            .filter(|t| !t.is_empty())
            .take(6)
            .collect();

        let [day, month, year, hour, minute, second] = parts[..] else {
            return Err(malformed());
        };

        let tokens = [year, month, day, hour, minute, second].map(str::to_string);
        if tokens
            .iter()
            .any(|t| !t.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(malformed());
        }

        let modified = tokens.concat().parse::<u64>().map_err(|_| malformed())?;

        Ok(Self { tokens, modified })
    }

    /// `{spreadsheet_id}-{Y}-{M}-{D}-{h}-{m}-{s}`.
    pub fn record_id(&self, spreadsheet_id: &str) -> String {
        format!("{spreadsheet_id}-{}", self.tokens.join("-"))
    }

    /// The id's timestamp digits as one integer.
    pub fn modified(&self) -> u64 {
        self.modified
    }
}
