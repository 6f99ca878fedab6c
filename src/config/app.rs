//! Application settings loaded from environment variables.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by `dotenvy` in `main`. Every setting has a default except the admin
//! group, whose absence simply means nobody is an administrator.

use crate::errors::{Error, Result};
use std::{net::SocketAddr, path::PathBuf, str::FromStr};
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_AUTO_REFRESH_SECS: u32 = 5;
const DEFAULT_ENVINFO_PATH: &str = "envinfo.toml";

/// Settings shared by the whole web service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Database connection URL
    pub database_url: String,
    /// Identity-provider group whose members are administrators
    pub admin_group: Option<String>,
    /// How often the scoreboard page re-polls, in seconds
    pub auto_refresh_secs: u32,
    /// Location of the environment info file
    pub envinfo_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: super::database::DEFAULT_DATABASE_URL.to_string(),
            admin_group: None,
            auto_refresh_secs: DEFAULT_AUTO_REFRESH_SECS,
            envinfo_path: PathBuf::from(DEFAULT_ENVINFO_PATH),
        }
    }
}

impl AppConfig {
    /// Reads every setting from the environment.
    ///
    /// # Errors
    /// Returns `Error::Config` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let admin_group = std::env::var("ADMIN_GROUP")
            .ok()
            .map(|group| group.trim().to_string())
            .filter(|group| !group.is_empty());
        if admin_group.is_none() {
            warn!("ADMIN_GROUP not set, no viewer will be treated as an administrator");
        }

        Ok(Self {
            bind_addr: parse_var("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            database_url: super::database::get_database_url(),
            admin_group,
            auto_refresh_secs: parse_var(
                "AUTO_REFRESH_SECS",
                &DEFAULT_AUTO_REFRESH_SECS.to_string(),
            )?,
            envinfo_path: parse_var("ENVINFO_PATH", DEFAULT_ENVINFO_PATH)?,
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| Error::Config {
        message: format!("Invalid {key} value {raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let port: u32 = parse_var("BLUE_DEVIL_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(port, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage_default() {
        let result: Result<SocketAddr> = parse_var("BLUE_DEVIL_TEST_UNSET_VARIABLE", "nope");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.auto_refresh_secs, 5);
        assert!(config.admin_group.is_none());
    }
}
