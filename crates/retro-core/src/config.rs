use crate::error::{Result, RetroError};
use crate::report;
use crate::token::TokenSigner;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "retro.yaml";

/// Environment variable that overrides `auth.secret`.
pub const SECRET_ENV: &str = "RETRO_AUTH_SECRET";

/// Placeholder secret written by `Config::default()`.
pub const DEV_SECRET: &str = "change-me";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the config file's directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("retro.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default = "default_ttl_hours")]
    pub token_ttl_hours: u32,
}

fn default_secret() -> String {
    DEV_SECRET.to_string()
}

fn default_ttl_hours() -> u32 {
    24 * 7
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            token_ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetroConfig {
    /// Board columns included in sprint reports, in order.
    #[serde(default = "report::default_columns")]
    pub columns: Vec<String>,
    /// Frontend base URL used when building invitation links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_public_url() -> String {
    "http://localhost:5173".to_string()
}

impl Default for RetroConfig {
    fn default() -> Self {
        Self {
            columns: report::default_columns(),
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// When set, every recorded submission is also POSTed here as JSON.
    #[serde(default)]
    pub forward_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub retro: RetroConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RetroError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(RetroError::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Apply `RETRO_AUTH_SECRET` when it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            if !secret.is_empty() {
                self.auth.secret = secret;
            }
        }
        self
    }

    /// Database location, resolving relative paths against `config_path`'s
    /// directory.
    pub fn database_path(&self, config_path: &Path) -> PathBuf {
        if self.database.path.is_absolute() {
            return self.database.path.clone();
        }
        match config_path.parent() {
            Some(dir) => dir.join(&self.database.path),
            None => self.database.path.clone(),
        }
    }

    pub fn signer(&self) -> Result<TokenSigner> {
        TokenSigner::new(&self.auth.secret, self.auth.token_ttl_hours)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message })
        };

        if self.auth.secret.is_empty() {
            push(WarnLevel::Error, "auth.secret must not be empty".into());
        } else if self.auth.secret == DEV_SECRET {
            push(
                WarnLevel::Warning,
                format!("auth.secret is the placeholder '{DEV_SECRET}'; set {SECRET_ENV}"),
            );
        }

        if self.auth.token_ttl_hours == 0 {
            push(
                WarnLevel::Error,
                "auth.token_ttl_hours must be greater than 0".into(),
            );
        }

        if self.retro.columns.is_empty() {
            push(
                WarnLevel::Error,
                "retro.columns must list at least one column".into(),
            );
        }
        let mut seen = HashSet::new();
        for column in &self.retro.columns {
            if column.trim().is_empty() {
                push(WarnLevel::Error, "retro.columns contains an empty name".into());
            } else if !seen.insert(column.as_str()) {
                push(
                    WarnLevel::Error,
                    format!("retro.columns lists '{column}' more than once"),
                );
            }
        }

        if !is_http_url(&self.retro.public_url) {
            push(
                WarnLevel::Warning,
                format!(
                    "retro.public_url '{}' is not an http(s) URL; invitation links will be broken",
                    self.retro.public_url
                ),
            );
        }

        if let Some(url) = &self.survey.forward_url {
            if !is_http_url(url) {
                push(
                    WarnLevel::Error,
                    format!("survey.forward_url '{url}' is not an http(s) URL"),
                );
            }
        }

        warnings
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
