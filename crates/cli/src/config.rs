//! CLI configuration utilities

use anyhow::{Context, Result};
use goftr_admin_core::AdminConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the data directory when `--data-dir` is not given
pub const STATE_DIR_ENV: &str = "GOFTR_ADMIN_STATE_DIR";

const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

/// `--data-dir`, then `$GOFTR_ADMIN_STATE_DIR`, then the platform data dir
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        if let Ok(state_dir) = std::env::var(STATE_DIR_ENV) {
            PathBuf::from(state_dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("goftr-admin")
        }
    })
}

/// Where the CLI keeps its tokens and cached profile
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// Load configuration from `--config`, or from `config.toml` in the data
/// directory when present
pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<AdminConfig> {
    let default_path = data_dir.join(CONFIG_FILE);
    let path = match explicit {
        Some(path) => Some(path),
        None if default_path.is_file() => Some(default_path.as_path()),
        None => None,
    };
    debug!(config = ?path, "Loading configuration");

    AdminConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid configuration".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/goftr-admin-test");
        assert_eq!(resolve_data_dir(Some(dir.clone())), dir);
        assert_eq!(session_path(&dir), dir.join("session.json"));
    }

    #[test]
    fn test_config_file_in_data_dir_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[api]\nbase_url = \"https://admin.example.com/api/v1\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = load(None, dir.path()).unwrap();
        assert_eq!(config.api.base_url, "https://admin.example.com/api/v1");
        assert_eq!(config.api.timeout_secs, 5);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(&missing), dir.path()).is_err());
    }
}
