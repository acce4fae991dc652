//! The published artifact: one JSON array of canonical records.
//!
//! Writes go to a uniquely-named temp file beside the target and are renamed
//! into place, so the feed service only ever sees a complete collection.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clubfeed_shared::{CanonicalRecord, ClubfeedError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Atomically replace the collection at `path`.
///
/// Returns the SHA-256 hex digest of the bytes written.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_collection(path: &Path, records: &[CanonicalRecord]) -> Result<String> {
    let bytes = serde_json::to_vec_pretty(records)
        .map_err(|e| ClubfeedError::validation(format!("JSON serialization failed: {e}")))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ClubfeedError::io(parent, e))?;
    }

    let temp = temp_path(path)?;
    if let Err(e) = write_synced(&temp, &bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(ClubfeedError::io(path, e));
    }

    let digest = sha256_hex(&bytes);
    debug!(size = bytes.len(), %digest, "wrote collection");
    Ok(digest)
}

/// Parse the collection at `path`.
pub fn read_collection(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let content = std::fs::read(path).map_err(|e| ClubfeedError::io(path, e))?;
    serde_json::from_slice(&content)
        .map_err(|e| ClubfeedError::parse(format!("{}: {e}", path.display())))
}

/// Digest of the current artifact, `None` when there is none yet.
pub fn artifact_digest(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(sha256_hex(&bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ClubfeedError::io(path, e)),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `.{name}.{uuid}.tmp` in the target's directory, so the rename never
/// crosses filesystems.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| ClubfeedError::config(format!("{} is not a file path", path.display())))?;
    let temp_name = format!(".{}.{}.tmp", name.to_string_lossy(), uuid::Uuid::now_v7());
    Ok(path.with_file_name(temp_name))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| ClubfeedError::io(path, e))?;
    file.write_all(bytes).map_err(|e| ClubfeedError::io(path, e))?;
    file.sync_all().map_err(|e| ClubfeedError::io(path, e))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_records() -> Vec<CanonicalRecord> {
        let content =
            std::fs::read_to_string("../../../fixtures/json/opportunities.fixture.json").unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with('.'))
            .collect()
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        let records = fixture_records();

        let digest = write_collection(&path, &records).unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(read_collection(&path).unwrap(), records);
        assert_eq!(artifact_digest(&path).unwrap(), Some(digest));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("feeds").join("opportunities.json");
        write_collection(&path, &[]).unwrap();
        assert!(read_collection(&path).unwrap().is_empty());
    }

    #[test]
    fn replaces_prior_artifact_without_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");

        let first = write_collection(&path, &fixture_records()).unwrap();
        let second = write_collection(&path, &[]).unwrap();

        assert_ne!(first, second);
        assert!(read_collection(&path).unwrap().is_empty());
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn same_records_give_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        let records = fixture_records();
        assert_eq!(
            write_collection(&path, &records).unwrap(),
            write_collection(&path, &records).unwrap()
        );
    }

    #[test]
    fn digest_of_missing_artifact_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(artifact_digest(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn corrupt_artifact_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        std::fs::write(&path, "[{\"id\":").unwrap();
        assert!(matches!(read_collection(&path), Err(ClubfeedError::Parse { .. })));
    }

    #[test]
    fn failed_write_leaves_prior_artifact_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opportunities.json");
        write_collection(&path, &fixture_records()).unwrap();
        let before = std::fs::read(&path).unwrap();

        // A plain file where the parent directory should be.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "not a directory").unwrap();
        assert!(write_collection(&blocked.join("opportunities.json"), &[]).is_err());

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
