use crate::output::print_json;
use anyhow::{bail, Context};
use clap::Subcommand;
use retro_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config file if none exists
    Init,

    /// Print the effective config (secret redacted)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(config_path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init => init(config_path),
        ConfigSubcommand::Show => show(config_path, json),
        ConfigSubcommand::Validate => validate(config_path, json),
    }
}

fn init(config_path: &Path) -> anyhow::Result<()> {
    let data = serde_yaml::to_string(&Config::default())?;
    let created = retro_core::io::write_if_missing(config_path, data.as_bytes())?;
    if created {
        println!("Wrote {}", config_path.display());
    } else {
        println!("{} already exists; left unchanged", config_path.display());
    }
    Ok(())
}

fn show(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if !config.auth.secret.is_empty() {
        config.auth.secret = "********".into();
    }
    if json {
        return print_json(&config);
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn validate(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .context("failed to load config")?
        .with_env_overrides();
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        bail!("config validation found errors");
    }
    Ok(())
}
