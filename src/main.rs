mod app;
mod auth;
mod cache;
mod cart;
mod catalog;
mod commands;
mod config;
mod connectivity;
mod error;
mod event;
mod notify;
mod remote;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::auth::{sign_in, PasswordAuth};
use crate::cache::{CacheBackend, NoopStorage, SqliteStorage};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::connectivity::TcpProbe;
use crate::event::EventHandler;
use crate::notify::Alert;
use crate::remote::DocumentClient;

#[derive(Parser, Debug)]
#[command(name = "bookstall")]
#[command(about = "Browse a bookstore catalog from the terminal and stage books in a cart")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/bookstall/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Account to sign in with; the password is read from BOOKSTALL_PASSWORD
  #[arg(short, long)]
  email: Option<String>,
}

/// Log to a daily file; the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("bookstall");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(log_dir, "bookstall.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .with_env_var("BOOKSTALL_LOG")
    .from_env_lossy();

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Ok(guard)
}

fn open_cache(config: &Config) -> CacheBackend {
  if !config.cache.enabled {
    return CacheBackend::Disabled(NoopStorage);
  }

  let opened = match &config.cache.path {
    Some(path) => SqliteStorage::open(path),
    None => SqliteStorage::open_default(),
  };

  match opened {
    Ok(storage) => CacheBackend::Sqlite(storage),
    Err(e) => {
      warn!(error = %e, "snapshot cache unavailable, continuing without it");
      CacheBackend::Disabled(NoopStorage)
    }
  }
}

/// Sign in when an account is configured, else fall back to a token from the environment.
async fn resolve_id_token(config: &Config, email: Option<&str>) -> Result<(Option<String>, Vec<Alert>)> {
  let Some(email) = email else {
    return Ok((Config::get_id_token(), Vec::new()));
  };

  let api_key = config
    .store
    .api_key
    .as_deref()
    .ok_or_else(|| eyre!("store.api_key is required to sign in"))?;
  let password = Config::get_password().unwrap_or_default();

  let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();
  let token = sign_in(&PasswordAuth::new(api_key), &tx, email, &password).await;
  drop(tx);

  let mut alerts = Vec::new();
  while let Some(alert) = rx.recv().await {
    alerts.push(alert);
  }
  Ok((token, alerts))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let _guard = init_logging()?;
  info!(project = %config.store.project_id, "starting");

  let email = args.email.or_else(|| config.auth.email.clone());
  let (id_token, alerts) = resolve_id_token(&config, email.as_deref()).await?;

  let client = DocumentClient::new(&config.store, id_token)?;
  let request_timeout = config.network.request_timeout();
  let store = CatalogStore::new(client.clone(), open_cache(&config), request_timeout);
  let probe = TcpProbe::new(config.network.probe_addr.clone(), config.network.probe_timeout());

  let events = EventHandler::new(Duration::from_millis(250));
  let mut app = app::App::new(
    config.display_title().to_string(),
    store,
    client,
    probe,
    request_timeout,
    events.sender(),
  );
  for alert in alerts {
    app.push_alert(alert);
  }

  app.run(events).await
}
