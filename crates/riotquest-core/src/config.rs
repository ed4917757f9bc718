use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dispatcher::{
    DispatcherConfig, DEFAULT_CONCURRENCY, DEFAULT_RETRY_LIMIT, DEFAULT_USER_AGENT,
};
use crate::request::Platform;

/// Global configuration loaded from `~/.config/riotquest/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiotQuestConfig {
    /// API key sent as `X-Riot-Token`. May be overridden from the CLI/env.
    #[serde(default)]
    pub api_key: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Maximum concurrent requests per wave.
    pub concurrency: usize,
    /// Retries allowed after the first attempt for connection/server errors.
    pub retry_limit: u32,
    /// Per-attempt timeout in seconds (e.g. 2.5).
    pub request_timeout_secs: f64,
    /// Default platform id (e.g. "na1", "kr").
    pub platform: String,
}

impl Default for RiotQuestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            retry_limit: DEFAULT_RETRY_LIMIT,
            request_timeout_secs: 10.0,
            platform: Platform::default().id().to_string(),
        }
    }
}

impl RiotQuestConfig {
    /// Dispatcher settings derived from this config.
    pub fn dispatcher_config(&self) -> Result<DispatcherConfig> {
        if !self.request_timeout_secs.is_finite() || self.request_timeout_secs <= 0.0 {
            anyhow::bail!(
                "request_timeout_secs must be a positive number, got {}",
                self.request_timeout_secs
            );
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Ok(DispatcherConfig {
            concurrency: self.concurrency,
            retry_limit: self.retry_limit,
            request_timeout: Duration::from_secs_f64(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        })
    }

    pub fn platform(&self) -> Result<Platform> {
        self.platform
            .parse::<Platform>()
            .map_err(anyhow::Error::msg)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("riotquest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RiotQuestConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RiotQuestConfig> {
    if !path.exists() {
        let default_cfg = RiotQuestConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: RiotQuestConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
