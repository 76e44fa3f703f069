use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CliError;

pub const DEFAULT_BASE_URL: &str = "https://api.mux.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_id: Option<String>,
    pub token_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_id: None,
            token_secret: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub concurrency: usize,
    pub poll_interval_ms: u64,
    /// 0 disables the deadline.
    pub poll_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            poll_interval_ms: 500,
            poll_timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            dir: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: Config = toml::from_str(content).context("failed to parse config file")?;
        Ok(raw)
    }

    /// Loads `explicit` if given, otherwise the default location when it exists,
    /// then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env("MUX_CONFIG").map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => match default_path(env) {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(env);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("MUX_TOKEN_ID") {
            self.api.token_id = Some(id);
        }
        if let Some(secret) = lookup("MUX_TOKEN_SECRET") {
            self.api.token_secret = Some(secret);
        }
        if let Some(url) = lookup("MUX_BASE_URL") {
            self.api.base_url = url;
        }
    }

    pub fn credentials(&self) -> Result<(&str, &str), CliError> {
        match (&self.api.token_id, &self.api.token_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(CliError::MissingCredentials),
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

pub fn default_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let base = if cfg!(windows) {
        env("APPDATA").map(PathBuf::from)
    } else {
        env("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env("HOME").map(|home| Path::new(&home).join(".config")))
    };
    base.map(|dir| dir.join("muxcli").join("config.toml"))
}
