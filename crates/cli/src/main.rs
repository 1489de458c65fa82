//! goftr-admin - command-line client for the goftr admin API

mod commands;
mod config;
mod logging;
mod navigator;
mod store;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use goftr_admin_core::{AdminConfig, TokenStore};
use goftr_admin_frontend_common::{RouteGuard, SessionStore};
use goftr_admin_http::AdminClient;
use navigator::TerminalNavigator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use store::FileStore;
use tracing::{Level, debug, error, warn};

#[derive(Parser)]
#[command(name = "goftr-admin")]
#[command(about = "Sign in to a goftr admin API and manage its users")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the stored session, config.toml and cli.log
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to config.toml in the data directory)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    let admin_config = config::load(cli.config.as_deref(), &data_dir)?;
    debug!(base_url = %admin_config.api.base_url, data_dir = %data_dir.display(), "Starting goftr-admin");

    let session = open_session(&admin_config, &data_dir)?;

    let outcome = if cli.timeout == 0 {
        cli.command.execute(&session).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(&session)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Command timed out after {} seconds",
                cli.timeout
            )),
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

/// Session backed by `session.json` in the data directory
fn open_session(admin_config: &AdminConfig, data_dir: &Path) -> Result<SessionStore> {
    let store = FileStore::open(config::session_path(data_dir))?;
    debug!(path = %store.path().display(), "Using session file");
    let client = AdminClient::builder()
        .base_url(&admin_config.api.base_url)
        .timeout(Duration::from_secs(admin_config.api.timeout_secs))
        .token_store(TokenStore::new(Arc::new(store)))
        .on_auth_failure(|| warn!("Session expired, run `goftr-admin login` to sign in again"))
        .build()?;

    Ok(SessionStore::new(
        client,
        Arc::new(TerminalNavigator::new("/")),
        RouteGuard::new(admin_config.routes.clone()),
    ))
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
