//! Room bot
//!
//! Loads the room configuration, opens the stats store and feeds host
//! events (JSON lines on stdin or a script file) through the room.

mod bridge;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use room_core::{HttpUploader, MemoryHost, Room, RoomConfig, SharedHost, SharedUploader, UserRepository};

use crate::bridge::Bridge;

#[derive(Parser)]
#[command(name = "room_bot")]
#[command(about = "Rule engine for a host-controlled football room", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "ROOM_BOT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON stats file (overrides stats.path)
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Replay host events from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<RoomConfig> {
    match path {
        Some(path) => RoomConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(RoomConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::info!("room_bot {} starting room \"{}\"", room_core::VERSION, config.room.name);

    let host = Arc::new(MemoryHost::new());
    let shared: SharedHost = host.clone();
    let users = Arc::new(UserRepository::new(config.users.clone()));
    let uploader: SharedUploader = Arc::new(HttpUploader::new(&config.recording));
    let plugins = Room::default_plugins(&shared, &config, &users, uploader);
    let mut room = Room::new(shared, &config, users, plugins);
    room.apply_settings(&config.room);

    let stats_path = cli.stats.or_else(|| config.stats.path.clone());
    room.open_store(stats_path.as_deref()).await.context("opening stats store")?;
    match &stats_path {
        Some(path) => tracing::info!("Stats stored in {}", path.display()),
        None => tracing::info!("Stats kept in memory"),
    }

    let mut stdout = tokio::io::stdout();
    let mut bridge = Bridge::new(&mut room, &host);
    let summary = match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?;
            bridge.run(BufReader::new(file), &mut stdout).await?
        }
        None => bridge.run(BufReader::new(tokio::io::stdin()), &mut stdout).await?,
    };

    tracing::info!("Processed {} events ({} rejected lines)", summary.events, summary.rejected);
    Ok(())
}
