use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 4] = [
    "goftr_admin",
    "goftr_admin_core",
    "goftr_admin_http",
    "goftr_admin_frontend_common",
];

/// Initialize logging for the CLI.
///
/// Events go to stderr, and also to `cli.log` in the data directory unless
/// `no_file_log` is set. `RUST_LOG` overrides the level.
pub fn init_logging(level: Level, data_dir: &Path, no_file_log: bool) -> Result<()> {
    let level_str = level.as_str().to_lowercase();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        CRATES
            .iter()
            .map(|krate| format!("{krate}={level_str}"))
            .collect::<Vec<_>>()
            .join(",")
            .into()
    });

    if no_file_log {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(());
    }

    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("cli.log"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_writes_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        init_logging(Level::INFO, dir.path(), false).unwrap();

        tracing::info!("log file check");

        let written = std::fs::read_to_string(dir.path().join("cli.log")).unwrap();
        assert!(written.contains("log file check"));
    }
}
