use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Reconcile the catalog against one or two source extracts.
    Sync(SyncArgs),
    /// Show catalog counts and recent sync runs.
    Status(StatusArgs),
    /// Decode an extract and print its layout and first records.
    Inspect(InspectArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SyncArgs {
    /// Primary extract (defaults to source.primary from config).
    pub primary: Option<String>,
    /// Supplementary extract merged over the primary one.
    #[arg(long)]
    pub supplementary: Option<String>,
    /// Classify and report without persisting anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Skip the run when no source changed since the last successful sync.
    #[arg(long)]
    pub if_changed: bool,
}

#[derive(Clone, Debug, Args)]
pub struct StatusArgs {
    /// Number of recent runs to show.
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(Clone, Debug, Args)]
pub struct InspectArgs {
    /// Extract to decode.
    pub file: String,
    /// Number of live records to print.
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}
