//! Loading and merging source extracts.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use catsync_config::SourceConfig;
use catsync_dbf::{ColumnMapping, DbfReader, ReadStats, SourceLayout, SourceRecord, merge_sources};

use crate::error::SyncError;

/// Column mapping from configuration. Blank companion columns are disabled.
#[must_use]
pub fn column_mapping(config: &SourceConfig) -> ColumnMapping {
    let optional = |name: &str| Some(name.trim().to_string()).filter(|n| !n.is_empty());
    ColumnMapping {
        key: config.key_field.clone(),
        description: config.description_field.clone(),
        price: config.price_field.clone(),
        stamp: config.stamp_field.clone(),
        barcodes: config
            .barcode_fields
            .iter()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .collect(),
        case_price: optional(&config.case_price_field),
        pack_price: optional(&config.pack_price_field),
        cost: optional(&config.cost_field),
    }
}

/// Records from one extract plus what the reader observed.
#[derive(Debug, Clone)]
pub struct LoadedExtract {
    pub path: PathBuf,
    pub records: Vec<SourceRecord>,
    pub stats: ReadStats,
}

/// Read statistics for each extract that fed a pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SourceStats {
    pub primary: ReadStats,
    pub supplementary: Option<ReadStats>,
}

impl SourceStats {
    /// Whether either extract ended before its declared record count.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.primary.truncated || self.supplementary.is_some_and(|s| s.truncated)
    }
}

/// Decode and project every live record of one extract.
///
/// The header, descriptor table and column mapping are validated before the
/// first record is read.
///
/// # Errors
///
/// Returns `SyncError::SourceMissing` if the file does not exist, or
/// `SyncError::Source` for a malformed extract or a missing required column.
pub fn load_extract(path: &Path, mapping: &ColumnMapping) -> Result<LoadedExtract, SyncError> {
    if !path.exists() {
        return Err(SyncError::SourceMissing(path.display().to_string()));
    }

    let mut reader = DbfReader::open(path)?;
    let layout = SourceLayout::resolve(reader.fields(), mapping)?;
    let declared = reader.header().record_count;

    let mut records = Vec::with_capacity(usize::try_from(declared).unwrap_or_default());
    let mut rows = reader.records()?;
    for raw in rows.by_ref() {
        records.push(layout.project(&raw?));
    }
    let stats = rows.stats();

    if stats.truncated {
        warn!(path = %path.display(), declared, read = stats.yielded + stats.deleted, "Extract truncated");
    }
    info!(
        path = %path.display(),
        live = stats.yielded,
        deleted = stats.deleted,
        field_errors = stats.field_errors,
        "Read extract"
    );

    Ok(LoadedExtract {
        path: path.to_path_buf(),
        records,
        stats,
    })
}

/// Load the primary extract and, when given, merge the supplementary one.
///
/// # Errors
///
/// Returns the first error from [`load_extract`].
pub fn load_sources(
    primary: &Path,
    supplementary: Option<&Path>,
    mapping: &ColumnMapping,
) -> Result<(Vec<SourceRecord>, SourceStats), SyncError> {
    let primary = load_extract(primary, mapping)?;
    let Some(path) = supplementary else {
        return Ok((
            primary.records,
            SourceStats {
                primary: primary.stats,
                supplementary: None,
            },
        ));
    };

    let supplementary = load_extract(path, mapping)?;
    let stats = SourceStats {
        primary: primary.stats,
        supplementary: Some(supplementary.stats),
    };
    let merged = merge_sources(primary.records, supplementary.records);
    info!(records = merged.len(), "Merged primary and supplementary extracts");
    Ok((merged, stats))
}
