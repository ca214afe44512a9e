//! Source fingerprint repository, backing skip-if-unchanged runs.

use catsync_core::entities::SourceFingerprint;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::parse_datetime;

impl CatalogDb {
    /// Fingerprint recorded by the last successful run for this source.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row parsing fails.
    pub async fn get_fingerprint(
        &self,
        sync_type: &str,
        source_path: &str,
    ) -> Result<Option<SourceFingerprint>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT sync_type, source_path, size_bytes, modified_at, recorded_at
                 FROM source_fingerprints WHERE sync_type = ?1 AND source_path = ?2",
                libsql::params![sync_type, source_path],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        Ok(Some(SourceFingerprint {
            sync_type: row.get::<String>(0)?,
            source_path: row.get::<String>(1)?,
            size_bytes: row.get::<i64>(2)?,
            modified_at: parse_datetime(&row.get::<String>(3)?)?,
            recorded_at: parse_datetime(&row.get::<String>(4)?)?,
        }))
    }

    /// Insert or replace the fingerprint for a source.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the upsert fails.
    pub async fn record_fingerprint(&self, fingerprint: &SourceFingerprint) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO source_fingerprints (sync_type, source_path, size_bytes, modified_at, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (sync_type, source_path) DO UPDATE SET
                     size_bytes = excluded.size_bytes,
                     modified_at = excluded.modified_at,
                     recorded_at = excluded.recorded_at",
                libsql::params![
                    fingerprint.sync_type.as_str(),
                    fingerprint.source_path.as_str(),
                    fingerprint.size_bytes,
                    fingerprint.modified_at.to_rfc3339(),
                    fingerprint.recorded_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }
}
