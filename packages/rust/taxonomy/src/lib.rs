//! Taxonomy loading: OpenActive concept schemes as label → URI lookups.
//!
//! Each run fetches the activity list and the accessibility-support scheme
//! fresh. Both documents are JSON-LD with a `concept` array of
//! `{id, prefLabel, ...}`; only those two fields are read. Any failure here is
//! fatal to the run, since row mapping needs complete lookups.

use std::time::Duration;

use clubfeed_shared::{ClubfeedError, Result, SourcesConfig, Taxonomy, TaxonomyConcept};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Scheme URI of the activity list, used when the document carries no `id`.
pub const ACTIVITY_SCHEME: &str = "https://openactive.io/activity-list";

/// Scheme URI of the accessibility-support list.
pub const ACCESSIBILITY_SCHEME: &str = "https://openactive.io/accessibility-support";

/// User-Agent string for taxonomy requests.
const USER_AGENT: &str = concat!("clubfeed/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two lookups a pipeline run needs.
#[derive(Debug, Clone, Default)]
pub struct Taxonomies {
    pub activities: Taxonomy,
    pub accessibility: Taxonomy,
}

/// The subset of a concept scheme document we read.
#[derive(Debug, Deserialize)]
struct ConceptScheme {
    #[serde(default)]
    id: Option<String>,
    concept: Vec<TaxonomyConcept>,
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch both taxonomies concurrently.
#[instrument(skip_all)]
pub async fn load_taxonomies(sources: &SourcesConfig) -> Result<Taxonomies> {
    let client = build_client(sources.timeout_secs)?;

    let (activities, accessibility) = tokio::join!(
        fetch_taxonomy(&client, &sources.activity_list_url, ACTIVITY_SCHEME),
        fetch_taxonomy(&client, &sources.accessibility_support_url, ACCESSIBILITY_SCHEME),
    );
    let taxonomies = Taxonomies {
        activities: activities?,
        accessibility: accessibility?,
    };

    info!(
        activities = taxonomies.activities.len(),
        accessibility = taxonomies.accessibility.len(),
        "taxonomies loaded"
    );

    Ok(taxonomies)
}

/// Fetch one concept scheme document and index it by `prefLabel`.
pub async fn fetch_taxonomy(client: &Client, url: &str, default_scheme: &str) -> Result<Taxonomy> {
    debug!(%url, "fetching taxonomy");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ClubfeedError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClubfeedError::Network(format!("{url}: HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ClubfeedError::Network(format!("{url}: failed to read body: {e}")))?;

    parse_scheme(&body, default_scheme)
        .map_err(|e| ClubfeedError::parse(format!("{url}: {e}")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_scheme(body: &str, default_scheme: &str) -> std::result::Result<Taxonomy, serde_json::Error> {
    let scheme: ConceptScheme = serde_json::from_str(body)?;
    let uri = scheme.id.unwrap_or_else(|| default_scheme.to_string());
    Ok(Taxonomy::new(uri, scheme.concept))
}

/// Build a reqwest client with appropriate settings.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClubfeedError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/json/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn sources_for(server: &wiremock::MockServer) -> SourcesConfig {
        SourcesConfig {
            activity_list_url: format!("{}/activity-list/activity-list.jsonld", server.uri()),
            accessibility_support_url: format!(
                "{}/accessibility-support/accessibility-support.jsonld",
                server.uri()
            ),
            ..SourcesConfig::default()
        }
    }

    async fn mount(server: &wiremock::MockServer, path: &str, status: u16, body: String) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn scheme_id_falls_back_to_default() {
        let taxonomy = parse_scheme(r#"{"concept":[]}"#, ACTIVITY_SCHEME).unwrap();
        assert_eq!(taxonomy.scheme, ACTIVITY_SCHEME);
        assert!(taxonomy.is_empty());
    }

    #[test]
    fn extra_concept_fields_are_ignored() {
        let body = r#"{
            "id": "https://openactive.io/activity-list",
            "concept": [{
                "id": "https://openactive.io/activity-list#6ca15167",
                "type": "Concept",
                "prefLabel": "Netball",
                "altLabel": ["Netball (Indoor)"],
                "broader": ["https://openactive.io/activity-list#0a5f732d"]
            }]
        }"#;
        let taxonomy = parse_scheme(body, "unused").unwrap();
        assert_eq!(
            taxonomy.resolve("Netball"),
            Some("https://openactive.io/activity-list#6ca15167")
        );
        assert_eq!(taxonomy.resolve("Netball (Indoor)"), None);
    }

    #[tokio::test]
    async fn loads_both_taxonomies() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/activity-list/activity-list.jsonld",
            200,
            fixture("activity-list.fixture.json"),
        )
        .await;
        mount(
            &server,
            "/accessibility-support/accessibility-support.jsonld",
            200,
            fixture("accessibility-support.fixture.json"),
        )
        .await;

        let taxonomies = load_taxonomies(&sources_for(&server)).await.unwrap();
        assert_eq!(taxonomies.activities.scheme, ACTIVITY_SCHEME);
        assert!(taxonomies.activities.resolve("Netball").is_some());
        assert_eq!(taxonomies.accessibility.scheme, ACCESSIBILITY_SCHEME);
        assert!(taxonomies.accessibility.resolve("Visual impairment").is_some());
    }

    #[tokio::test]
    async fn http_error_is_fatal() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/activity-list/activity-list.jsonld",
            200,
            fixture("activity-list.fixture.json"),
        )
        .await;
        mount(
            &server,
            "/accessibility-support/accessibility-support.jsonld",
            503,
            String::new(),
        )
        .await;

        let err = load_taxonomies(&sources_for(&server)).await.unwrap_err();
        assert!(matches!(err, ClubfeedError::Network(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn malformed_document_is_a_parse_error() {
        let server = wiremock::MockServer::start().await;
        mount(
            &server,
            "/activity-list/activity-list.jsonld",
            200,
            "<html>not json</html>".into(),
        )
        .await;
        mount(
            &server,
            "/accessibility-support/accessibility-support.jsonld",
            200,
            fixture("accessibility-support.fixture.json"),
        )
        .await;

        let err = load_taxonomies(&sources_for(&server)).await.unwrap_err();
        assert!(matches!(err, ClubfeedError::Parse { .. }));
    }
}
