use std::path::Path;

use anyhow::Context;
use catsync_config::CatsyncConfig;

use crate::cli::GlobalFlags;

/// Load configuration, layering `--config` when given.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<CatsyncConfig> {
    match flags.config.as_deref() {
        Some(path) => CatsyncConfig::load_from(Path::new(path))
            .with_context(|| format!("failed to load config from {path}")),
        None => CatsyncConfig::load_with_dotenv().context("failed to load configuration"),
    }
}
