use dirs::home_dir;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::enums::DatabaseType;
use crate::query_ast::{GenerateOptions, QueryAstError, QuoteStyle};

const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "SQLCHAIN_";

/// User-level settings. Passed explicitly to every call site that needs them;
/// there is no global instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub quote_style: QuoteStyle,
    /// When set, the quoting style is derived from the target database.
    pub database: Option<DatabaseType>,
    pub pretty: bool,
    pub execution_timeout_ms: u64,
    /// Row cap applied before execution; `None` runs queries uncapped.
    pub max_rows: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quote_style: QuoteStyle::default(),
            database: None,
            pretty: false,
            execution_timeout_ms: 30_000,
            max_rows: Some(1000),
        }
    }
}

impl AppConfig {
    /// `~/.sqlchain/config.json` if it exists, then `SQLCHAIN_*` environment overrides.
    pub fn load() -> Result<Self, QueryAstError> {
        let path = config_path();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config = Self::from_json(&content)?;
            info!("Loaded config from {}", path.display());
            config
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, QueryAstError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply overrides read through `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), QueryAstError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("QUOTE_STYLE") {
            self.quote_style = v.parse().map_err(QueryAstError::Config)?;
        }
        if let Some(v) = var("DATABASE") {
            self.database = Some(v.parse().map_err(QueryAstError::Config)?);
        }
        if let Some(v) = var("PRETTY") {
            self.pretty = parse_bool(&v).ok_or_else(|| QueryAstError::Config(format!("invalid {ENV_PREFIX}PRETTY: {v}")))?;
        }
        if let Some(v) = var("TIMEOUT_MS") {
            self.execution_timeout_ms = v
                .parse()
                .map_err(|_| QueryAstError::Config(format!("invalid {ENV_PREFIX}TIMEOUT_MS: {v}")))?;
        }
        if let Some(v) = var("MAX_ROWS") {
            self.max_rows = match v.trim() {
                "" | "0" | "none" => None,
                n => Some(n.parse().map_err(|_| QueryAstError::Config(format!("invalid {ENV_PREFIX}MAX_ROWS: {v}")))?),
            };
        }
        Ok(())
    }

    pub fn generate_options(&self) -> GenerateOptions {
        match &self.database {
            Some(db) => GenerateOptions::for_database(db),
            None => GenerateOptions::with_quote_style(self.quote_style),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `SQLCHAIN_CONFIG_DIR` when it is absolute, else `~/.sqlchain`.
pub fn config_dir() -> PathBuf {
    if let Ok(custom_dir) = std::env::var(format!("{ENV_PREFIX}CONFIG_DIR")) {
        let path = PathBuf::from(&custom_dir);
        if path.is_absolute() {
            return path;
        }
        warn!("Ignoring relative {ENV_PREFIX}CONFIG_DIR: {}", custom_dir);
    }

    if let Some(mut hd) = home_dir() {
        hd.push(".sqlchain");
        return hd;
    }
    PathBuf::from(".sqlchain")
}

fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}
