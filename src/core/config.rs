use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, info};

use super::catalog::Catalog;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub catalog: Catalog,

    #[serde(default)]
    pub workflows: WorkflowSource,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub bot_token: String,

    /// Requests are not verified when this is empty.
    #[serde(default)]
    pub signing_secret: String,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSource {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_listen() -> String {
    "127.0.0.1:3001".to_string()
}
fn default_api_base() -> String {
    "https://slack.com/api".to_string()
}
fn default_reload_interval() -> u64 {
    60
}
fn default_level() -> String {
    "info".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            signing_secret: String::new(),
            listen: default_listen(),
            api_base: default_api_base(),
        }
    }
}

impl Default for WorkflowSource {
    fn default() -> Self {
        Self {
            path: None,
            reload_interval_secs: default_reload_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl WorkflowSource {
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

impl BotConfig {
    /// `$CLUSTERBOT_CONFIG`, else `<config dir>/clusterbot/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("CLUSTERBOT_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clusterbot")
            .join("config.toml")
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config: BotConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Fill secrets from the environment (`SLACK_BOT_TOKEN`, `SLACK_SIGNING_SECRET`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("SLACK_BOT_TOKEN").filter(|v| !v.is_empty()) {
            self.slack.bot_token = token;
        }
        if let Some(secret) = lookup("SLACK_SIGNING_SECRET").filter(|v| !v.is_empty()) {
            self.slack.signing_secret = secret;
        }
    }
}
