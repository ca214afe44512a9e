//! # catsync-sync
//!
//! Reconciliation engine for catsync.
//!
//! Takes the merged records of one or two source extracts and brings the
//! catalog store in line with them:
//! - [`reconcile`]: classify each record as new, changed or unchanged and
//!   write the result through a batched session
//! - [`activity`]: flip active flags by set membership
//! - [`report`]: write the human-readable change report and its JSONL twin
//! - [`runner`]: one end-to-end run with ledger bookkeeping
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use catsync_config::CatsyncConfig;
//! use catsync_db::CatalogDb;
//! use catsync_sync::{SyncRequest, SyncRunner};
//!
//! let config = CatsyncConfig::load()?;
//! let db = CatalogDb::open_local(&config.database.path).await?;
//! let summary = SyncRunner::new(&db, &config)
//!     .run(&SyncRequest {
//!         primary: "MP_MER.FPB".into(),
//!         ..SyncRequest::default()
//!     })
//!     .await?;
//! println!("{} changes", summary.total_changes());
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod error;
pub mod fingerprint;
pub mod reconcile;
pub mod report;
pub mod runner;
pub mod source;

pub use error::SyncError;
pub use reconcile::{CatalogSnapshot, ReconcileOutcome, Reconciler};
pub use report::ChangeReportWriter;
pub use runner::{RunOutcome, SyncRequest, SyncRunner, SyncSummary};
