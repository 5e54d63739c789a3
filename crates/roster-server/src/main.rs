//! roster-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! subscription store, and serves the Roster JSON API over HTTP. Without a
//! `store_path` the store is in-memory.
//!
//! Notifications are written to the log; a deployment that delivers presence
//! to live sessions embeds `roster-core` with its own notifier instead.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_core::{
  memory::MemoryStore, notify::LogNotifier, service::SubscriptionService,
  store::SubscriptionStore,
};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Roster presence subscription server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  match &cfg.store_path {
    Some(path) => {
      let store = SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(?path, "using SQLite store");
      serve(store, &cfg).await
    }
    None => {
      tracing::warn!("no store_path configured; subscriptions are kept in memory only");
      serve(MemoryStore::new(), &cfg).await
    }
  }
}

async fn serve<S>(store: S, cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: SubscriptionStore + 'static,
{
  let service = Arc::new(SubscriptionService::new(store, LogNotifier));
  let app = roster_api::api_router(service).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
