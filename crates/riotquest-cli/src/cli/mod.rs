//! CLI for the RiotQuest API client.

mod commands;
mod settings;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use riotquest_core::config;

use commands::{run_call, run_get};

/// Top-level CLI for the RiotQuest API client.
#[derive(Debug, Parser)]
#[command(name = "riotquest")]
#[command(about = "RiotQuest: batch client for the Riot Games API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by every request-issuing command.
#[derive(Debug, Clone, Default, Args)]
pub struct RequestOpts {
    /// API key sent as X-Riot-Token (overrides config.toml).
    #[arg(long, env = "RIOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Platform routing id, e.g. na1, euw1, kr (overrides config.toml).
    #[arg(long)]
    pub platform: Option<String>,

    /// Base URL (scheme + host) to use instead of the platform API host.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Query parameter; repeat for several.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Retries after the first attempt for connection/server errors.
    #[arg(long, value_name = "N")]
    pub retry_limit: Option<u32>,

    /// Per-attempt timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch several API paths concurrently and print each result.
    Get {
        /// API paths, e.g. /lol/status/v4/platform-data.
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        opts: RequestOpts,
    },

    /// Fetch one API path and print its JSON body.
    Call {
        /// API path, e.g. /lol/summoner/v4/summoners/by-name/hide.
        path: String,

        #[command(flatten)]
        opts: RequestOpts,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {:?}", s)),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { paths, opts } => run_get(&cfg, &paths, &opts).await?,
            CliCommand::Call { path, opts } => run_call(&cfg, &path, &opts).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
