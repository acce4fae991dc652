//! RPDE-style feed over the published artifact.
//!
//! `GET /` serves the whole collection in one page; `GET /last` is the
//! terminal page with no items. The artifact is re-read on every request and
//! any problem reading it is served as an empty collection.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::Json;
use axum::routing::get;
use clubfeed_shared::{ClubfeedError, FeedConfig, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Shared, read-only state of the feed service.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub artifact_path: PathBuf,
    pub license: String,
    /// Public base URL; derived per request from the headers when unset.
    pub base_url: Option<String>,
}

impl From<&FeedConfig> for FeedState {
    fn from(config: &FeedConfig) -> Self {
        Self {
            artifact_path: config.opportunities_path.clone(),
            license: config.license.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

pub fn build_router(state: FeedState) -> Router {
    Router::new()
        .route("/", get(feed))
        .route("/last", get(last))
        .with_state(Arc::new(state))
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: &FeedConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ClubfeedError::Network(format!("failed to bind {addr}: {e}")))?;
    let local: SocketAddr = listener
        .local_addr()
        .map_err(|e| ClubfeedError::Network(format!("failed to read bound address: {e}")))?;

    info!(
        addr = %local,
        artifact = %config.opportunities_path.display(),
        "feed listening"
    );

    axum::serve(listener, build_router(FeedState::from(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ClubfeedError::Network(format!("server failed: {e}")))?;

    info!("feed stopped");
    Ok(())
}

/// RPDE page envelope.
///
/// Items are passed through as stored, so records written by another
/// producer are served as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage {
    /// Always the terminal `/last` page; the feed does not paginate.
    pub next: String,
    pub license: String,
    pub items: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn feed(State(state): State<Arc<FeedState>>, headers: HeaderMap) -> Json<FeedPage> {
    let items = load_items(&state).await;
    debug!(items = items.len(), "serving feed");
    Json(page(&state, &headers, items))
}

async fn last(State(state): State<Arc<FeedState>>, headers: HeaderMap) -> Json<FeedPage> {
    Json(page(&state, &headers, Vec::new()))
}

fn page(state: &FeedState, headers: &HeaderMap, items: Vec<Value>) -> FeedPage {
    FeedPage {
        next: format!("{}/last", base_url(state, headers)),
        license: state.license.clone(),
        items,
    }
}

/// Configured base URL, else `{X-Forwarded-Proto or http}://{Host}`.
fn base_url(state: &FeedState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.base_url {
        return base.clone();
    }

    let proto = header_str(headers, FORWARDED_PROTO)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = header_str(headers, HOST.as_str()).unwrap_or("localhost");

    format!("{proto}://{host}")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn load_items(state: &FeedState) -> Vec<Value> {
    let path = &state.artifact_path;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no artifact yet, serving empty feed");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read artifact, serving empty feed");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(path = %path.display(), "artifact is not a JSON array, serving empty feed");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artifact is not valid JSON, serving empty feed");
            Vec::new()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clubfeed_shared::DEFAULT_LICENSE;

    use super::*;

    const FIXTURE: &str = "../../../fixtures/json/opportunities.fixture.json";

    async fn spawn(state: FeedState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = build_router(state);
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
        format!("http://{addr}")
    }

    fn state_for(path: &Path) -> FeedState {
        FeedState {
            artifact_path: path.to_path_buf(),
            license: DEFAULT_LICENSE.into(),
            base_url: None,
        }
    }

    async fn get_json(url: &str) -> serde_json::Value {
        let response = reqwest::get(url).await.expect("request");
        assert_eq!(response.status(), 200);
        response.json().await.expect("json body")
    }

    #[tokio::test]
    async fn root_serves_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        std::fs::copy(FIXTURE, &path).unwrap();

        let base = spawn(state_for(&path)).await;
        let body = get_json(&format!("{base}/")).await;

        assert_eq!(body["next"], format!("{base}/last"));
        assert_eq!(body["license"], DEFAULT_LICENSE);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["kind"], "Club");
        assert_eq!(body["items"][0]["data"]["organizer"]["logo"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn last_page_has_no_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        std::fs::copy(FIXTURE, &path).unwrap();

        let base = spawn(state_for(&path)).await;
        let body = get_json(&format!("{base}/last")).await;

        assert_eq!(body["next"], format!("{base}/last"));
        assert_eq!(body["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_artifact_is_empty_feed() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(state_for(&dir.path().join("nope.json"))).await;
        let body = get_json(&base).await;
        assert_eq!(body["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn corrupt_artifact_is_empty_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        std::fs::write(&path, "{ not json").unwrap();

        let base = spawn(state_for(&path)).await;
        let body = get_json(&base).await;
        assert_eq!(body["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn records_outside_club_schema_are_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        let stored = serde_json::json!([{
            "id": "legacy-2023-1-2-3-4-05",
            "kind": "Club",
            "state": "updated",
            "modified": 202312340,
            "data": { "type": "Club", "name": "Legacy Netball" }
        }]);
        std::fs::write(&path, serde_json::to_vec(&stored).unwrap()).unwrap();

        let base = spawn(state_for(&path)).await;
        let body = get_json(&base).await;
        assert_eq!(body["items"], stored);
    }

    #[tokio::test]
    async fn non_array_artifact_is_empty_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        std::fs::write(&path, r#"{"items": []}"#).unwrap();

        let base = spawn(state_for(&path)).await;
        let body = get_json(&base).await;
        assert_eq!(body["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn artifact_is_reread_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        let base = spawn(state_for(&path)).await;

        assert_eq!(get_json(&base).await["items"], serde_json::json!([]));
        std::fs::copy(FIXTURE, &path).unwrap();
        assert_eq!(get_json(&base).await["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn configured_base_url_wins() {
        let dir = tempfile::tempdir().unwrap();
        let state = FeedState {
            base_url: Some("https://feeds.example.org/clubs".into()),
            ..state_for(&dir.path().join("opportunities.json"))
        };
        let base = spawn(state).await;
        let body = get_json(&base).await;
        assert_eq!(body["next"], "https://feeds.example.org/clubs/last");
    }

    #[tokio::test]
    async fn forwarded_proto_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn(state_for(&dir.path().join("opportunities.json"))).await;

        let body: serde_json::Value = reqwest::Client::new()
            .get(format!("{base}/last"))
            .header(FORWARDED_PROTO, "https, http")
            .header(HOST.as_str(), "clubs.example.org")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["next"], "https://clubs.example.org/last");
    }
}
