//! Google Sheets values API client.

use std::time::{Duration, Instant};

use clubfeed_shared::{ClubfeedError, Result, SourcesConfig};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

use crate::RowSource;
use crate::credentials::ServiceAccountKey;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("clubfeed/", env!("CARGO_PKG_VERSION"));

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before the server says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Reads form responses with a service account.
#[derive(Debug)]
pub struct SheetsClient {
    http: Client,
    key: ServiceAccountKey,
    api_base: Url,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl SheetsClient {
    pub fn new(key: ServiceAccountKey, sources: &SourcesConfig) -> Result<Self> {
        let api_base = Url::parse(&sources.sheets_api_base).map_err(|e| {
            ClubfeedError::config(format!(
                "invalid sheets_api_base '{}': {e}",
                sources.sheets_api_base
            ))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(ClubfeedError::config(format!(
                "sheets_api_base '{api_base}' cannot be a base URL"
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(sources.timeout_secs))
            .build()
            .map_err(|e| ClubfeedError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            key,
            api_base,
            range: sources.sheet_range.clone(),
            token: Mutex::new(None),
        })
    }

    /// `GET {api_base}/v4/spreadsheets/{id}/values/{range}`, with each part
    /// percent-encoded as a path segment.
    fn values_url(&self, spreadsheet_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", spreadsheet_id, "values", &self.range]);
        }
        url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// A valid access token, exchanging a fresh assertion when the cached one
    /// is missing or close to expiry.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange_token(&self) -> Result<CachedToken> {
        let assertion = self.key.assertion(chrono::Utc::now().timestamp())?;
        debug!(token_uri = %self.key.token_uri, "exchanging service-account assertion");

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| ClubfeedError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClubfeedError::Auth(format!(
                "token endpoint returned HTTP {status}: {}",
                body.trim()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClubfeedError::Auth(format!("invalid token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

// ---------------------------------------------------------------------------
// RowSource
// ---------------------------------------------------------------------------

impl RowSource for SheetsClient {
    #[instrument(skip(self))]
    async fn fetch_values(&self, spreadsheet_id: &str) -> Result<Vec<Vec<String>>> {
        let token = self.access_token().await?;
        let url = self.values_url(spreadsheet_id);
        debug!(%url, "fetching sheet values");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClubfeedError::Network(format!("{spreadsheet_id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClubfeedError::sheets(spreadsheet_id, format!("HTTP {status}")));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| ClubfeedError::sheets(spreadsheet_id, format!("invalid values body: {e}")))?;

        debug!(rows = range.values.len(), "sheet values received");

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// Formatted values arrive as strings; anything else is rendered as JSON text.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
