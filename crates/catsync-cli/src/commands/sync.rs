use std::path::{Path, PathBuf};

use anyhow::Context;
use catsync_config::CatsyncConfig;
use catsync_db::CatalogDb;
use catsync_sync::{RunOutcome, SyncRequest, SyncRunner};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SyncArgs;
use crate::output::output;
use crate::progress::Progress;
use crate::write_lock;

/// Handle `catsync sync`.
pub async fn handle(args: &SyncArgs, config: &CatsyncConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let request = build_request(args, config)?;

    let _lock = write_lock::acquire(Path::new(&config.sync.lock_path)).await?;
    let db = CatalogDb::open_local(&config.database.path)
        .await
        .with_context(|| format!("failed to open catalog at {}", config.database.path))?;

    let progress = Progress::spinner(&format!("Syncing {}", request.primary.display()));
    let summary = match SyncRunner::new(&db, config).run(&request).await {
        Ok(summary) => summary,
        Err(error) => {
            progress.finish_err("sync failed");
            return Err(error).context("sync failed");
        }
    };
    progress.finish_ok(&match summary.outcome {
        RunOutcome::Unchanged => String::from("sources unchanged, nothing to do"),
        RunOutcome::DryRun => format!("dry run: {} changes (not persisted)", summary.total_changes()),
        RunOutcome::Success => format!("synced: {} changes", summary.total_changes()),
    });

    output(&summary, flags.format)
}

/// Resolve CLI arguments over configured default paths.
fn build_request(args: &SyncArgs, config: &CatsyncConfig) -> anyhow::Result<SyncRequest> {
    let primary = args
        .primary
        .as_deref()
        .or_else(|| config.source.primary_path())
        .context("no primary extract: pass a path or set source.primary")?;
    let supplementary = args
        .supplementary
        .as_deref()
        .or_else(|| config.source.supplementary_path());

    Ok(SyncRequest {
        primary: PathBuf::from(primary),
        supplementary: supplementary.map(PathBuf::from),
        dry_run: args.dry_run,
        if_changed: args.if_changed,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use catsync_config::CatsyncConfig;

    use super::build_request;
    use crate::cli::root_commands::SyncArgs;

    fn args(primary: Option<&str>) -> SyncArgs {
        SyncArgs {
            primary: primary.map(String::from),
            supplementary: None,
            dry_run: false,
            if_changed: true,
        }
    }

    #[test]
    fn cli_path_overrides_configured_default() {
        let mut config = CatsyncConfig::default();
        config.source.primary = "/cfg/MP_MER.FPB".into();
        config.source.supplementary = "/cfg/MP_MER2.FPB".into();

        let request = build_request(&args(Some("/cli/MP_MER.FPB")), &config).unwrap();
        assert_eq!(request.primary, PathBuf::from("/cli/MP_MER.FPB"));
        assert_eq!(request.supplementary, Some(PathBuf::from("/cfg/MP_MER2.FPB")));
        assert!(request.if_changed);
    }

    #[test]
    fn missing_primary_is_an_error() {
        let err = build_request(&args(None), &CatsyncConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no primary extract"));
    }
}
