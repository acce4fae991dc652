//! Application configuration for clubfeed.
//!
//! User config lives at `~/.clubfeed/clubfeed.toml` (or wherever `--config`
//! points). CLI flags and environment variables override config file values,
//! which override defaults. The binaries merge those layers into one
//! [`AppConfig`] at startup and resolve it into the runtime [`IngestConfig`]
//! or [`FeedConfig`]; nothing below the binaries reads the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClubfeedError, Result};
use crate::types::DEFAULT_LICENSE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "clubfeed.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".clubfeed";

/// Environment variables recognised by the binaries.
pub const ENV_KEY_DIR: &str = "RELATIVE_FILEPATH_KEY";
pub const ENV_KEY_FILE: &str = "FILENAME_KEY";
pub const ENV_SPREADSHEET_IDS_DIR: &str = "RELATIVE_FILEPATH_SPREADSHEET_IDS";
pub const ENV_SPREADSHEET_IDS_FILE: &str = "FILENAME_SPREADSHEET_IDS";
pub const ENV_OPPORTUNITIES_DIR: &str = "RELATIVE_FILEPATH_OPPORTUNITIES";
pub const ENV_OPPORTUNITIES_FILE: &str = "FILENAME_OPPORTUNITIES";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BASE_URL: &str = "CLUBFEED_BASE_URL";

// ---------------------------------------------------------------------------
// Config structs (matching clubfeed.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Remote taxonomy documents and the spreadsheet API.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Record construction settings.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Spreadsheet header names, one per club field.
    #[serde(default)]
    pub columns: ColumnSchema,

    /// Feed service settings.
    #[serde(default)]
    pub feed: FeedSettings,
}

/// `[paths]` section. Each location is a directory plus a file name, matching
/// how the deployment mounts its storage volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the service-account key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_dir: Option<String>,
    /// Service-account key file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    /// Directory holding the spreadsheet-id list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_ids_dir: Option<String>,
    /// Spreadsheet-id list file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_ids_file: Option<String>,
    /// Directory holding the published opportunities artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunities_dir: Option<String>,
    /// Opportunities artifact file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunities_file: Option<String>,
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Activity taxonomy document.
    #[serde(default = "default_activity_list_url")]
    pub activity_list_url: String,

    /// Accessibility-support taxonomy document.
    #[serde(default = "default_accessibility_support_url")]
    pub accessibility_support_url: String,

    /// Base URL of the spreadsheet values API.
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,

    /// Sheet (range) name read from every spreadsheet.
    #[serde(default = "default_sheet_range")]
    pub sheet_range: String,

    /// Timeout in seconds for every outbound HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            activity_list_url: default_activity_list_url(),
            accessibility_support_url: default_accessibility_support_url(),
            sheets_api_base: default_sheets_api_base(),
            sheet_range: default_sheet_range(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_activity_list_url() -> String {
    "https://openactive.io/activity-list/activity-list.jsonld".into()
}
fn default_accessibility_support_url() -> String {
    "https://openactive.io/accessibility-support/accessibility-support.jsonld".into()
}
fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".into()
}
fn default_sheet_range() -> String {
    "Form responses 1".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// What to do when a spreadsheet returns no rows at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySheetPolicy {
    /// Warn and continue with the next spreadsheet.
    #[default]
    Skip,
    /// Stop the run without writing the artifact.
    Abort,
}

/// `[mapping]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Prefix for the `@id` URIs of clubs, places and organisations.
    #[serde(default = "default_id_base_url")]
    pub id_base_url: String,

    /// Country code written into every postal address.
    #[serde(default = "default_address_country")]
    pub address_country: String,

    /// Behaviour for spreadsheets with no data.
    #[serde(default)]
    pub empty_sheet_policy: EmptySheetPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            id_base_url: default_id_base_url(),
            address_country: default_address_country(),
            empty_sheet_policy: EmptySheetPolicy::default(),
        }
    }
}

fn default_id_base_url() -> String {
    "https://www.openactive.io".into()
}
fn default_address_country() -> String {
    "GB".into()
}

/// `[columns]` section: the header text of each form question.
///
/// Defaults match the club registration form's "Form responses 1" sheet.
/// Override individual entries when a form words a question differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub timestamp: String,
    pub verified: String,
    pub primary_email: String,
    pub activities: String,
    pub accessibility_support: String,
    pub accessibility_description: String,

    pub location_name: String,
    pub location_description: String,
    pub location_street: String,
    pub location_locality: String,
    pub location_region: String,
    pub location_postcode: String,
    pub location_latitude: String,
    pub location_longitude: String,
    pub location_telephone: String,
    pub location_email: String,
    pub location_url: String,
    pub location_images: String,
    pub location_amenities: String,

    pub organiser_name: String,
    pub organiser_legal_name: String,
    pub organiser_description: String,
    /// Holds either the "same as the location" answer or anything else.
    pub organiser_address: String,
    pub organiser_street: String,
    pub organiser_locality: String,
    pub organiser_region: String,
    pub organiser_postcode: String,
    pub organiser_telephone: String,
    pub organiser_email: String,
    pub organiser_url: String,
    pub organiser_logo: String,
    pub organiser_social: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            timestamp: "Timestamp".into(),
            verified: "Verified".into(),
            primary_email: "Email address".into(),
            activities: "Activity options".into(),
            accessibility_support: "Accessibility support".into(),
            accessibility_description: "Accessibility description".into(),

            location_name: "Location common name".into(),
            location_description: "Location description".into(),
            location_street: "Location street address".into(),
            location_locality: "Location locality".into(),
            location_region: "Location region".into(),
            location_postcode: "Location post code".into(),
            location_latitude: "Location latitude".into(),
            location_longitude: "Location longitude".into(),
            location_telephone: "Location telephone".into(),
            location_email: "Location email".into(),
            location_url: "Location main web address".into(),
            location_images: "Location image web addresses".into(),
            location_amenities: "Location amenity features".into(),

            organiser_name: "Organiser common name".into(),
            organiser_legal_name: "Organiser legal name".into(),
            organiser_description: "Organiser description".into(),
            organiser_address: "Organiser physical address".into(),
            organiser_street: "Organiser street address".into(),
            organiser_locality: "Organiser locality".into(),
            organiser_region: "Organiser region".into(),
            organiser_postcode: "Organiser post code".into(),
            organiser_telephone: "Organiser telephone".into(),
            organiser_email: "Organiser email".into(),
            organiser_url: "Organiser main web address".into(),
            organiser_logo: "Organiser logo web address".into(),
            organiser_social: "Organiser social media web addresses".into(),
        }
    }
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL used for the `next` link. Derived from the request's
    /// `Host` header when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Licence URL advertised on every page.
    #[serde(default = "default_license")]
    pub license: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            license: default_license(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_license() -> String {
    DEFAULT_LICENSE.into()
}

// ---------------------------------------------------------------------------
// Runtime configs (resolved once at startup)
// ---------------------------------------------------------------------------

/// Everything the ingestion pipeline needs, with required paths resolved.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Service-account key file.
    pub key_path: PathBuf,
    /// Spreadsheet-id list file.
    pub spreadsheet_ids_path: PathBuf,
    /// Published artifact.
    pub opportunities_path: PathBuf,
    pub sources: SourcesConfig,
    pub mapping: MappingConfig,
    pub columns: ColumnSchema,
}

impl IngestConfig {
    /// Resolve from the merged app config, failing on the first missing
    /// required setting.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        let paths = &config.paths;
        Ok(Self {
            key_path: join_required(
                &paths.key_dir,
                ("paths.key_dir", ENV_KEY_DIR),
                &paths.key_file,
                ("paths.key_file", ENV_KEY_FILE),
            )?,
            spreadsheet_ids_path: join_required(
                &paths.spreadsheet_ids_dir,
                ("paths.spreadsheet_ids_dir", ENV_SPREADSHEET_IDS_DIR),
                &paths.spreadsheet_ids_file,
                ("paths.spreadsheet_ids_file", ENV_SPREADSHEET_IDS_FILE),
            )?,
            opportunities_path: opportunities_path(config)?,
            sources: config.sources.clone(),
            mapping: config.mapping.clone(),
            columns: config.columns.clone(),
        })
    }
}

/// Everything the feed service needs.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Artifact re-read on every request.
    pub opportunities_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub base_url: Option<String>,
    pub license: String,
}

impl FeedConfig {
    /// Resolve from the merged app config.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        let base_url = match &config.feed.base_url {
            Some(raw) => {
                let parsed = url::Url::parse(raw).map_err(|e| {
                    ClubfeedError::config(format!("feed.base_url '{raw}' is not a URL: {e}"))
                })?;
                Some(parsed.as_str().trim_end_matches('/').to_string())
            }
            None => None,
        };

        Ok(Self {
            opportunities_path: opportunities_path(config)?,
            host: config.feed.host.clone(),
            port: config.feed.port,
            base_url,
            license: config.feed.license.clone(),
        })
    }
}

fn opportunities_path(config: &AppConfig) -> Result<PathBuf> {
    join_required(
        &config.paths.opportunities_dir,
        ("paths.opportunities_dir", ENV_OPPORTUNITIES_DIR),
        &config.paths.opportunities_file,
        ("paths.opportunities_file", ENV_OPPORTUNITIES_FILE),
    )
}

fn join_required(
    dir: &Option<String>,
    dir_names: (&str, &str),
    file: &Option<String>,
    file_names: (&str, &str),
) -> Result<PathBuf> {
    let dir = require(dir, dir_names)?;
    let file = require(file, file_names)?;
    Ok(Path::new(dir).join(file))
}

fn require<'a>(value: &'a Option<String>, (key, env): (&str, &str)) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ClubfeedError::config(format!(
            "missing required setting {key} (set {env} or add it to {CONFIG_FILE_NAME})"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.clubfeed/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClubfeedError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.clubfeed/clubfeed.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClubfeedError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ClubfeedError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClubfeedError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClubfeedError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClubfeedError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
