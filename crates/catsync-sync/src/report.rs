//! Human-readable change report plus a JSON-lines twin for tooling.
//!
//! Both files are audit artifacts only; nothing reads them back.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use catsync_core::changes::{ChangeEvent, ChangeSet};
use catsync_core::entities::SyncCounters;
use catsync_core::enums::ChangeKind;

use crate::error::SyncError;

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

/// Run details printed in the report header.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<String>,
    pub run_id: Option<i64>,
    pub dry_run: bool,
    pub counters: SyncCounters,
}

/// Paths of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub jsonl: PathBuf,
}

/// Writes timestamped change reports into a directory.
pub struct ChangeReportWriter {
    dir: PathBuf,
}

impl ChangeReportWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `sync_changes_<YYYYMMDD_HHMMSS>.txt` and `.jsonl`.
    ///
    /// A run landing in the same second as an earlier report gets a `_2`,
    /// `_3`, ... suffix instead of overwriting it.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Io` if the directory or either file cannot be
    /// written. Callers treat this as non-fatal.
    pub fn write(&self, changes: &ChangeSet, context: &ReportContext) -> Result<ReportPaths, SyncError> {
        std::fs::create_dir_all(&self.dir)?;
        let stem = format!("sync_changes_{}", context.generated_at.format("%Y%m%d_%H%M%S"));
        let (paths, mut text) = self.claim(&stem)?;

        text.write_all(render(changes, context).as_bytes())?;
        serde_jsonlines::write_json_lines(&paths.jsonl, changes.events())?;
        Ok(paths)
    }

    /// Create the text file under the first free name for `stem`.
    fn claim(&self, stem: &str) -> Result<(ReportPaths, File), SyncError> {
        let mut attempt = 1_u32;
        loop {
            let name = if attempt == 1 {
                stem.to_string()
            } else {
                format!("{stem}_{attempt}")
            };
            let text = self.dir.join(format!("{name}.txt"));
            match OpenOptions::new().write(true).create_new(true).open(&text) {
                Ok(file) => {
                    let paths = ReportPaths {
                        text,
                        jsonl: self.dir.join(format!("{name}.jsonl")),
                    };
                    return Ok((paths, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Render the text report.
///
/// Sections follow [`ChangeKind::ALL`]; price changes are listed by absolute
/// percentage change, largest first.
#[must_use]
pub fn render(changes: &ChangeSet, context: &ReportContext) -> String {
    let mut out = String::new();
    let c = &context.counters;

    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "CATALOG SYNC - CHANGE REPORT");
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "Date: {}", context.generated_at.format("%Y-%m-%d %H:%M:%S"));
    for source in &context.sources {
        let _ = writeln!(out, "Source: {source}");
    }
    match (context.dry_run, context.run_id) {
        (true, _) => {
            let _ = writeln!(out, "Mode: DRY RUN (nothing persisted)");
        }
        (false, Some(id)) => {
            let _ = writeln!(out, "Run: #{id}");
        }
        (false, None) => {}
    }
    let _ = writeln!(
        out,
        "Records: {} processed, {} added, {} updated, {} skipped",
        c.processed, c.added, c.updated, c.skipped
    );
    let _ = writeln!(
        out,
        "Activity: {} activated, {} deactivated",
        c.activated, c.deactivated
    );
    let _ = writeln!(out);

    for kind in ChangeKind::ALL {
        let events: Vec<&ChangeEvent> = if kind == ChangeKind::PriceChange {
            changes.price_changes_by_magnitude()
        } else {
            changes.of_kind(kind).collect()
        };

        let _ = writeln!(out, "{} ({})", section_title(kind), events.len());
        let _ = writeln!(out, "{RULE_LIGHT}");
        for event in events {
            render_event(&mut out, event);
        }
        let _ = writeln!(out);
    }

    out
}

const fn section_title(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::NewProduct => "NEW PRODUCTS",
        ChangeKind::PriceChange => "PRICE CHANGES",
        ChangeKind::DescriptionChange => "DESCRIPTION CHANGES (REVIEW REQUIRED)",
        ChangeKind::BarcodeAdded => "NEW BARCODES",
    }
}

fn render_event(out: &mut String, event: &ChangeEvent) {
    let _ = match event {
        ChangeEvent::NewProduct {
            product_key,
            description,
            price,
        } => writeln!(out, "{product_key}\t{description}\t{price:.2}"),
        ChangeEvent::PriceChange {
            product_key,
            description,
            old_price,
            new_price,
        } => writeln!(
            out,
            "{product_key}\t{description}\t{old_price:.2} -> {new_price:.2}\t{:+.1}%",
            event.pct_change().unwrap_or_default()
        ),
        ChangeEvent::DescriptionChange {
            product_key,
            old_description,
            new_description,
        } => writeln!(
            out,
            "{product_key}\n  OLD: {old_description}\n  NEW: {new_description}\n"
        ),
        ChangeEvent::BarcodeAdded {
            product_key,
            barcode,
            is_primary,
        } => writeln!(
            out,
            "{product_key}\t{barcode}{}",
            if *is_primary { "\t(primary)" } else { "" }
        ),
    };
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;

    fn context() -> ReportContext {
        ReportContext {
            generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 6, 30, 5).unwrap(),
            sources: vec!["/data/MP_MER.FPB".into()],
            run_id: Some(42),
            dry_run: false,
            counters: SyncCounters {
                processed: 3,
                added: 1,
                updated: 2,
                ..SyncCounters::default()
            },
        }
    }

    fn sample() -> ChangeSet {
        let mut set = ChangeSet::new();
        set.push(ChangeEvent::NewProduct {
            product_key: "1000016".into(),
            description: "WHITE BREAD 350G".into(),
            price: 45.5,
        });
        set.push(ChangeEvent::PriceChange {
            product_key: "a".into(),
            description: "SMALL".into(),
            old_price: 100.0,
            new_price: 101.0,
        });
        set.push(ChangeEvent::PriceChange {
            product_key: "b".into(),
            description: "LARGE".into(),
            old_price: 100.0,
            new_price: 80.0,
        });
        set.push(ChangeEvent::DescriptionChange {
            product_key: "1000020".into(),
            old_description: "WHITE BREAD 350G".into(),
            new_description: "WHITE BREAD 400G".into(),
        });
        set
    }

    #[test]
    fn sections_and_price_order() {
        let text = render(&sample(), &context());

        assert!(text.contains("Run: #42"));
        assert!(text.contains("NEW PRODUCTS (1)"));
        assert!(text.contains("1000016\tWHITE BREAD 350G\t45.50"));
        assert!(text.contains("PRICE CHANGES (2)"));
        assert!(text.contains("b\tLARGE\t100.00 -> 80.00\t-20.0%"));
        assert!(text.contains("a\tSMALL\t100.00 -> 101.00\t+1.0%"));
        let large = text.find("b\tLARGE").unwrap();
        let small = text.find("a\tSMALL").unwrap();
        assert!(large < small, "larger change should be listed first");
        assert!(text.contains("  OLD: WHITE BREAD 350G\n  NEW: WHITE BREAD 400G"));
        assert!(text.contains("NEW BARCODES (0)"));
    }

    #[test]
    fn dry_run_is_flagged() {
        let ctx = ReportContext {
            dry_run: true,
            run_id: None,
            ..context()
        };
        assert!(render(&ChangeSet::new(), &ctx).contains("Mode: DRY RUN"));
    }

    #[test]
    fn writes_text_and_jsonl_files() {
        let dir = TempDir::new().unwrap();
        let writer = ChangeReportWriter::new(dir.path().join("reports"));

        let paths = writer.write(&sample(), &context()).unwrap();
        assert!(paths.text.ends_with("sync_changes_20261019_063005.txt"));

        let events: Vec<ChangeEvent> = serde_jsonlines::json_lines(&paths.jsonl)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events, sample().events());
    }

    #[test]
    fn same_second_reports_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let writer = ChangeReportWriter::new(dir.path());

        let first = writer.write(&sample(), &context()).unwrap();
        let second = writer.write(&ChangeSet::new(), &context()).unwrap();

        assert!(second.text.ends_with("sync_changes_20261019_063005_2.txt"));
        assert!(second.jsonl.ends_with("sync_changes_20261019_063005_2.jsonl"));
        let kept = std::fs::read_to_string(&first.text).unwrap();
        assert!(kept.contains("NEW PRODUCTS (1)"));
        assert!(std::fs::read_to_string(&second.text).unwrap().contains("NEW PRODUCTS (0)"));
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("reports");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = ChangeReportWriter::new(&blocker)
            .write(&sample(), &context())
            .unwrap_err();
        assert!(matches!(err, SyncError::Io(_)), "got {err:?}");
    }
}
