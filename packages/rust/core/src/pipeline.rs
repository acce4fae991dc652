//! End-to-end ingestion run: spreadsheet ids → sheet values → mapped
//! records → published artifact.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use clubfeed_mapper::{BoundSchema, MapContext, is_verified, map_row};
use clubfeed_sheets::{RowSource, ServiceAccountKey, SheetsClient, read_spreadsheet_ids};
use clubfeed_shared::{ClubfeedError, EmptySheetPolicy, IngestConfig, Result};
use clubfeed_taxonomy::{Taxonomies, load_taxonomies};

use crate::store;

/// A verified row that could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub spreadsheet_id: String,
    /// 1-based row number in the sheet; the header is row 1.
    pub row_number: usize,
    pub reason: String,
}

/// Result of one ingestion run.
#[derive(Debug)]
pub struct IngestSummary {
    /// Spreadsheets whose rows were mapped.
    pub spreadsheets: usize,
    /// Spreadsheets skipped because they returned no rows.
    pub sheets_skipped: usize,
    /// Data rows read, header rows excluded.
    pub rows_seen: usize,
    pub rows_unverified: usize,
    pub failures: Vec<RowFailure>,
    /// Records written to the artifact.
    pub records: usize,
    pub artifact_path: PathBuf,
    /// SHA-256 of the written artifact.
    pub digest: String,
    /// Whether the artifact differs from the one it replaced.
    pub changed: bool,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each spreadsheet is fetched.
    fn sheet_started(&self, spreadsheet_id: &str, current: usize, total: usize);
    /// Called for each verified row that failed to map.
    fn row_failed(&self, failure: &RowFailure);
    /// Called when the pipeline completes.
    fn done(&self, summary: &IngestSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sheet_started(&self, _spreadsheet_id: &str, _current: usize, _total: usize) {}
    fn row_failed(&self, _failure: &RowFailure) {}
    fn done(&self, _summary: &IngestSummary) {}
}

/// Run the pipeline against the real taxonomy documents and Sheets API.
#[instrument(skip_all)]
pub async fn ingest(config: &IngestConfig, progress: &dyn ProgressReporter) -> Result<IngestSummary> {
    progress.phase("Loading taxonomies");
    let taxonomies = load_taxonomies(&config.sources).await?;

    progress.phase("Authenticating");
    let key = ServiceAccountKey::from_file(&config.key_path)?;
    let client = SheetsClient::new(key, &config.sources)?;

    run_ingest(config, &taxonomies, &client, progress).await
}

/// Map every spreadsheet listed in the id file and replace the artifact.
///
/// 1. Read spreadsheet ids
/// 2. Fetch and bind each sheet
/// 3. Map verified rows; row failures are collected, not fatal
/// 4. Write the artifact atomically
///
/// Any error before step 4 leaves the existing artifact untouched.
#[instrument(skip_all, fields(artifact = %config.opportunities_path.display()))]
pub async fn run_ingest<S: RowSource + Sync>(
    config: &IngestConfig,
    taxonomies: &Taxonomies,
    source: &S,
    progress: &dyn ProgressReporter,
) -> Result<IngestSummary> {
    let start = Instant::now();

    // --- Phase 1: Spreadsheet ids ---
    progress.phase("Reading spreadsheet ids");
    let spreadsheet_ids = read_spreadsheet_ids(&config.spreadsheet_ids_path)?;
    info!(count = spreadsheet_ids.len(), "starting ingest");

    // --- Phase 2: Fetch and map ---
    progress.phase("Mapping form responses");
    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut spreadsheets = 0;
    let mut sheets_skipped = 0;
    let mut rows_seen = 0;
    let mut rows_unverified = 0;

    let total = spreadsheet_ids.len();
    for (i, spreadsheet_id) in spreadsheet_ids.iter().enumerate() {
        progress.sheet_started(spreadsheet_id, i + 1, total);

        let values = source.fetch_values(spreadsheet_id).await?;
        let Some((headers, rows)) = values.split_first() else {
            match config.mapping.empty_sheet_policy {
                EmptySheetPolicy::Skip => {
                    warn!(%spreadsheet_id, "spreadsheet returned no rows, skipping");
                    sheets_skipped += 1;
                    continue;
                }
                EmptySheetPolicy::Abort => {
                    return Err(ClubfeedError::sheets(
                        spreadsheet_id.as_str(),
                        "spreadsheet returned no rows",
                    ));
                }
            }
        };

        let schema = BoundSchema::bind(spreadsheet_id, headers, &config.columns)?;
        let ctx = MapContext {
            spreadsheet_id,
            id_base_url: &config.mapping.id_base_url,
            address_country: &config.mapping.address_country,
            activities: &taxonomies.activities,
            accessibility: &taxonomies.accessibility,
        };

        let before = records.len();
        for (index, cells) in rows.iter().enumerate() {
            rows_seen += 1;
            let row = schema.read(cells);
            if !is_verified(&row) {
                rows_unverified += 1;
                continue;
            }

            match map_row(&row, &ctx) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => rows_unverified += 1,
                Err(e) => {
                    let failure = RowFailure {
                        spreadsheet_id: spreadsheet_id.clone(),
                        row_number: index + 2,
                        reason: e.to_string(),
                    };
                    warn!(
                        spreadsheet_id = %failure.spreadsheet_id,
                        row = failure.row_number,
                        error = %e,
                        "row failed to map, skipping"
                    );
                    progress.row_failed(&failure);
                    failures.push(failure);
                }
            }
        }

        spreadsheets += 1;
        debug!(
            %spreadsheet_id,
            rows = rows.len(),
            records = records.len() - before,
            "spreadsheet mapped"
        );
    }

    // --- Phase 3: Publish ---
    progress.phase("Writing artifact");
    let previous = store::artifact_digest(&config.opportunities_path)?;
    let digest = store::write_collection(&config.opportunities_path, &records)?;

    let summary = IngestSummary {
        spreadsheets,
        sheets_skipped,
        rows_seen,
        rows_unverified,
        failures,
        records: records.len(),
        artifact_path: config.opportunities_path.clone(),
        changed: previous.as_deref() != Some(digest.as_str()),
        digest,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        spreadsheets = summary.spreadsheets,
        records = summary.records,
        failed = summary.failures.len(),
        changed = summary.changed,
        elapsed_ms = summary.elapsed.as_millis(),
        "ingest complete"
    );

    Ok(summary)
}
