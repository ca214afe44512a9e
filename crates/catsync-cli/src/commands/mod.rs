pub mod inspect;
pub mod status;
pub mod sync;

use catsync_config::CatsyncConfig;

use crate::cli::{Commands, GlobalFlags};

/// Dispatch a parsed command that needs configuration.
pub async fn dispatch(command: &Commands, config: &CatsyncConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Sync(args) => sync::handle(args, config, flags).await,
        Commands::Status(args) => status::handle(args, config, flags).await,
        Commands::Inspect(args) => inspect::handle(args, flags),
    }
}
