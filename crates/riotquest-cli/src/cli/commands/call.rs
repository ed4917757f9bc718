//! `riotquest call <path>` – one synchronous request.

use anyhow::{Context, Result};
use riotquest_core::config::RiotQuestConfig;

use crate::cli::settings::Settings;
use crate::cli::RequestOpts;

pub async fn run_call(cfg: &RiotQuestConfig, path: &str, opts: &RequestOpts) -> Result<()> {
    let settings = Settings::resolve(cfg, opts)?;
    let path = path.to_string();
    let value = tokio::task::spawn_blocking(move || -> Result<serde_json::Value> {
        let descriptor = settings.descriptor(&path);
        Ok(settings.dispatcher()?.call(descriptor)?)
    })
    .await
    .context("call task join")??;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
