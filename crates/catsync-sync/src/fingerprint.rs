//! Size/mtime fingerprints for skip-if-unchanged runs.

use std::path::Path;

use chrono::{DateTime, Utc};

use catsync_core::entities::SourceFingerprint;
use catsync_db::CatalogDb;

use crate::error::SyncError;

/// Fingerprint a source file as it is on disk now.
///
/// # Errors
///
/// Returns `SyncError::SourceMissing` if the file does not exist, or
/// `SyncError::Io` if its metadata cannot be read.
pub fn fingerprint_file(
    sync_type: &str,
    path: &Path,
    now: DateTime<Utc>,
) -> Result<SourceFingerprint, SyncError> {
    if !path.exists() {
        return Err(SyncError::SourceMissing(path.display().to_string()));
    }
    let metadata = std::fs::metadata(path)?;
    Ok(SourceFingerprint {
        sync_type: sync_type.to_string(),
        source_path: path.display().to_string(),
        size_bytes: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
        modified_at: DateTime::<Utc>::from(metadata.modified()?),
        recorded_at: now,
    })
}

/// Whether every fingerprint matches the one stored by the last successful
/// run. A source never seen before counts as changed.
///
/// # Errors
///
/// Returns `SyncError::Database` if a stored fingerprint cannot be read.
pub async fn all_unchanged(db: &CatalogDb, current: &[SourceFingerprint]) -> Result<bool, SyncError> {
    for fingerprint in current {
        let stored = db
            .get_fingerprint(&fingerprint.sync_type, &fingerprint.source_path)
            .await?;
        if !stored.is_some_and(|s| s.matches(fingerprint.size_bytes, fingerprint.modified_at)) {
            return Ok(false);
        }
    }
    Ok(!current.is_empty())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn unseen_then_recorded_then_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("MP_MER.FPB");
        std::fs::write(&path, b"first").unwrap();
        let db = CatalogDb::open_local(":memory:").await.unwrap();

        let current = vec![fingerprint_file("CATALOG_SYNC", &path, Utc::now()).unwrap()];
        assert!(!all_unchanged(&db, &current).await.unwrap());

        db.record_fingerprint(&current[0]).await.unwrap();
        assert!(all_unchanged(&db, &current).await.unwrap());

        std::fs::write(&path, b"second, longer").unwrap();
        let current = vec![fingerprint_file("CATALOG_SYNC", &path, Utc::now()).unwrap()];
        assert!(!all_unchanged(&db, &current).await.unwrap());
    }

    #[test]
    fn missing_file_is_source_missing() {
        let dir = TempDir::new().unwrap();
        let err = fingerprint_file("CATALOG_SYNC", &dir.path().join("nope.dbf"), Utc::now()).unwrap_err();
        assert!(matches!(err, SyncError::SourceMissing(_)), "got {err:?}");
    }
}
