//! `arenabot` — runs the bot from a TOML config file.
//!
//! ```text
//! arenabot --config arenabot.toml --bot-mode search_ladder --run-count 5
//! ```
//!
//! Flags override the file. `RUST_LOG` overrides `log_level`.

use std::path::PathBuf;

use anyhow::Context;
use arenabot::prelude::*;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "arenabot", version, about = "Automated player for a turn-based arena server")]
struct Args {
    /// TOML configuration file.
    #[arg(long, short, env = "ARENABOT_CONFIG", default_value = "arenabot.toml")]
    config: PathBuf,

    #[arg(long, env = "ARENABOT_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ARENABOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// `host[:port]` of the arena server.
    #[arg(long, env = "ARENABOT_WEBSOCKET_URI")]
    websocket_uri: Option<String>,

    /// accept_challenge, challenge_user or search_ladder.
    #[arg(long, value_parser = parse_mode)]
    bot_mode: Option<BotMode>,

    #[arg(long)]
    format: Option<String>,

    /// Decision engine id (`first`, `random`).
    #[arg(long)]
    engine: Option<String>,

    #[arg(long)]
    run_count: Option<u32>,

    #[arg(long)]
    user_to_challenge: Option<String>,

    /// JSON file for win/loss records.
    #[arg(long)]
    records_path: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,
}

fn parse_mode(value: &str) -> Result<BotMode, String> {
    value.parse().map_err(|e: ArenaError| e.to_string())
}

impl Args {
    /// Reads the config file and lays the flags over it.
    fn into_config(self) -> anyhow::Result<BotConfig> {
        let mut config = BotConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;

        if let Some(username) = self.username {
            config.username = username;
        }
        if self.password.is_some() {
            config.password = self.password;
        }
        if let Some(uri) = self.websocket_uri {
            config.websocket_uri = uri;
        }
        if let Some(mode) = self.bot_mode {
            config.bot_mode = mode;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if self.run_count.is_some() {
            config.run_count = self.run_count;
        }
        if self.user_to_challenge.is_some() {
            config.user_to_challenge = self.user_to_challenge;
        }
        if self.records_path.is_some() {
            config.records_path = self.records_path;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config.validated()?)
    }
}

fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_tracing(&config.log_level);

    match config.records_path.clone() {
        Some(path) => {
            let records = JsonRecordStore::open(&path)
                .await
                .with_context(|| format!("opening records at {}", path.display()))?;
            play(config, records).await
        }
        None => play(config, MemoryRecordStore::new()).await,
    }
}

async fn play<R: RecordStore>(config: BotConfig, records: R) -> anyhow::Result<()> {
    let mut bot = BotBuilder::new(config)
        .connect(records)
        .await
        .context("connecting to the arena server")?;

    let outcome = tokio::select! {
        outcome = bot.run() => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Err(e) = bot.shutdown().await {
        warn!(error = %e, "closing the connection failed");
    }

    match outcome {
        Some(Ok(summary)) => {
            info!(
                matches = summary.matches,
                wins = summary.wins,
                losses = summary.losses,
                ties = summary.ties,
                "run complete"
            );
            Ok(())
        }
        Some(Err(e)) => Err(e).context("bot stopped"),
        None => {
            info!("interrupted");
            Ok(())
        }
    }
}
