//! Admin client configuration

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `GOFTR_ADMIN_API__BASE_URL`
pub const ENV_PREFIX: &str = "GOFTR_ADMIN";

/// Main admin client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    /// REST API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Navigation guard settings
    #[serde(default)]
    pub routes: RouteConfig,
}

/// REST API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Request timeout in seconds (ignored in the browser)
    pub timeout_secs: u64,
}

/// Which pages are public, which are admin-only, and where to send users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub login_path: String,
    pub not_found_path: String,
    pub reset_password_path: String,

    /// Paths reachable without a session
    pub public_pages: Vec<String>,

    /// Path prefixes reserved for admins
    pub restricted_prefixes: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3005/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            not_found_path: "/not-found".to_string(),
            reset_password_path: "/reset-password".to_string(),
            public_pages: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/reset-password".to_string(),
            ],
            restricted_prefixes: vec!["/users".to_string()],
        }
    }
}

impl AdminConfig {
    /// Load configuration from defaults, an optional TOML file and
    /// `GOFTR_ADMIN_*` environment variables, in increasing precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value cannot be parsed,
    /// or the merged configuration fails validation
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("routes.login_path", defaults.routes.login_path)?
            .set_default("routes.not_found_path", defaults.routes.not_found_path)?
            .set_default(
                "routes.reset_password_path",
                defaults.routes.reset_password_path,
            )?
            .set_default("routes.public_pages", defaults.routes.public_pages)?
            .set_default(
                "routes.restricted_prefixes",
                defaults.routes.restricted_prefixes,
            )?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail at first use
    pub fn validate(&self) -> CoreResult<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(CoreError::invalid_config("api.base_url: cannot be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CoreError::invalid_config(format!(
                "api.base_url: expected an http(s) URL, got '{base_url}'"
            )));
        }

        let routes = &self.routes;
        for (field, path) in [
            ("routes.login_path", &routes.login_path),
            ("routes.not_found_path", &routes.not_found_path),
            ("routes.reset_password_path", &routes.reset_password_path),
        ] {
            if !path.starts_with('/') {
                return Err(CoreError::invalid_config(format!(
                    "{field}: must start with '/', got '{path}'"
                )));
            }
        }

        if !routes.public_pages.contains(&routes.login_path) {
            return Err(CoreError::invalid_config(
                "routes.public_pages: must contain the login path",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AdminConfig::default();
        config.validate().unwrap();
        assert_eq!(config.routes.restricted_prefixes, vec!["/users"]);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://admin.example.com/api/v1"

[routes]
restricted_prefixes = ["/users", "/settings"]
"#
        )
        .unwrap();

        let config = AdminConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://admin.example.com/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.routes.restricted_prefixes, vec!["/users", "/settings"]);
        assert_eq!(config.routes.login_path, "/login");
    }

    #[test]
    fn test_rejects_relative_paths() {
        let mut config = AdminConfig::default();
        config.routes.not_found_path = "404".to_string();
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut config = AdminConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }
}
