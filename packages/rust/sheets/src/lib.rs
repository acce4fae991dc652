//! Spreadsheet row source: form responses as rows of strings.
//!
//! The pipeline only depends on [`RowSource`]. [`SheetsClient`] implements it
//! against the Google Sheets values API using a service-account key, and tests
//! plug in in-memory sources.

pub mod client;
pub mod credentials;
pub mod ids;

use std::future::Future;

use clubfeed_shared::Result;

pub use client::SheetsClient;
pub use credentials::ServiceAccountKey;
pub use ids::{parse_spreadsheet_ids, read_spreadsheet_ids};

/// Anything that can hand back the raw cell grid of one spreadsheet.
///
/// The first row is the header row. Rows may be ragged: trailing empty cells
/// are usually omitted by the API.
pub trait RowSource {
    fn fetch_values(
        &self,
        spreadsheet_id: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>>> + Send;
}
