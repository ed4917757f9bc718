//! Merge config.toml with command-line overrides.

use anyhow::{bail, Result};
use riotquest_core::config::RiotQuestConfig;
use riotquest_core::dispatcher::{Dispatcher, TracingObserver};
use riotquest_core::request::{JsonGet, Platform};
use std::sync::Arc;

use super::RequestOpts;

/// Everything a command needs to build its dispatcher and descriptors.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub api_key: String,
    /// config.toml with `--retry-limit`/`--timeout` applied.
    pub config: RiotQuestConfig,
    pub platform: Platform,
    pub base_url: Option<String>,
    pub params: Vec<(String, String)>,
}

impl Settings {
    pub fn resolve(cfg: &RiotQuestConfig, opts: &RequestOpts) -> Result<Self> {
        let api_key = match opts.api_key.as_ref().or(cfg.api_key.as_ref()) {
            Some(k) if !k.trim().is_empty() => k.trim().to_string(),
            _ => bail!("no API key: pass --api-key, set RIOT_API_KEY, or set api_key in config.toml"),
        };

        let mut config = cfg.clone();
        if let Some(limit) = opts.retry_limit {
            config.retry_limit = limit;
        }
        if let Some(secs) = opts.timeout {
            if !secs.is_finite() || secs <= 0.0 {
                bail!("--timeout must be a positive number of seconds, got {}", secs);
            }
            config.request_timeout_secs = secs;
        }
        config.dispatcher_config()?;

        let platform = match &opts.platform {
            Some(id) => id.parse::<Platform>().map_err(anyhow::Error::msg)?,
            None => cfg.platform()?,
        };

        Ok(Self {
            api_key,
            config,
            platform,
            base_url: opts.base_url.clone(),
            params: opts.params.clone(),
        })
    }

    pub fn dispatcher(&self) -> Result<Dispatcher> {
        Ok(Dispatcher::from_config(self.api_key.clone(), &self.config)?
            .with_observer(Arc::new(TracingObserver)))
    }

    pub fn descriptor(&self, path: &str) -> JsonGet<serde_json::Value> {
        let get = match &self.base_url {
            Some(base) => JsonGet::with_base(base.clone(), path),
            None => JsonGet::new(self.platform, path),
        };
        self.params
            .iter()
            .fold(get, |get, (name, value)| get.param(name, value))
    }
}
