pub mod config;
pub mod invite;
pub mod member;
pub mod report;
pub mod serve;
pub mod survey;
pub mod team;
pub mod token;

use anyhow::Context;
use retro_core::config::Config;
use retro_core::db::RetroDb;
use std::path::Path;

/// Load the config (defaults when the file is missing) with env overrides.
pub(crate) fn load_config(config_path: &Path) -> anyhow::Result<Config> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    Ok(config.with_env_overrides())
}

/// Load the config and open its database.
pub(crate) fn open(config_path: &Path) -> anyhow::Result<(Config, RetroDb)> {
    let config = load_config(config_path)?;
    let db_path = config.database_path(config_path);
    let db = RetroDb::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    Ok((config, db))
}
