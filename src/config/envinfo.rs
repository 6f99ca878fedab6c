//! Environment info loading from envinfo.toml
//!
//! The file describes the competition network as seen by the teams: how each
//! service's internal address maps to a per-team NAT address, the default
//! credentials of every box, and per-team login templates. It is optional;
//! without it the info page is simply empty.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Configuration structure representing the entire envinfo.toml file
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EnvInfo {
    #[serde(default)]
    pub service_ip_scheme: Vec<ServiceIp>,
    #[serde(default)]
    pub default_passwords: Vec<DefaultPassword>,
    #[serde(default)]
    pub env_login_templates: Vec<EnvLoginTemplate>,
}

/// Addressing of one service inside every team's network
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIp {
    pub service: String,
    pub internal_ip: String,
    /// Leading octets of the NAT address, e.g. `"10.10"`
    #[serde(default)]
    pub nat_prefix: Option<String>,
    /// Added to the team id to form the third octet
    #[serde(default)]
    pub nat_base: i64,
    /// Final octet
    #[serde(default)]
    pub nat_suffix: i64,
    /// Template rendered with `team` in scope, e.g. `"10.10.{{ team + 39 }}.9"`.
    /// Takes precedence over the prefix/base/suffix triple.
    #[serde(default)]
    pub nat_template: Option<String>,
}

/// One set of credentials on a box
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Default credentials of one box
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultPassword {
    #[serde(rename = "box")]
    pub box_name: String,
    pub os: String,
    pub ip: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub logins: Vec<LoginEntry>,
}

/// Per-team login for a hosted environment; `{team}` and `TEAM` are replaced
#[derive(Debug, Clone, Deserialize)]
pub struct EnvLoginTemplate {
    pub service: String,
    pub url_template: String,
    pub username_template: String,
    pub password_template: String,
}

/// Loads environment info from a TOML file.
///
/// A missing file is not an error and yields an empty `EnvInfo`.
///
/// # Errors
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_envinfo<P: AsRef<Path>>(path: P) -> Result<EnvInfo> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Environment info file {:?} not found, using empty defaults", path);
        return Ok(EnvInfo::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read environment info file {path:?}: {e}"),
    })?;
    let envinfo: EnvInfo = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse environment info file {path:?}: {e}"),
    })?;

    info!(
        "Loaded environment info: {} services, {} boxes, {} login templates",
        envinfo.service_ip_scheme.len(),
        envinfo.default_passwords.len(),
        envinfo.env_login_templates.len()
    );
    Ok(envinfo)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_envinfo() {
        let toml_str = r#"
            [[service_ip_scheme]]
            service = "web"
            internal_ip = "192.168.1.10"
            nat_prefix = "10.10"
            nat_base = 39
            nat_suffix = 9

            [[service_ip_scheme]]
            service = "dns"
            internal_ip = "192.168.1.53"
            nat_template = "10.20.{{ team }}.53"

            [[default_passwords]]
            box = "dc01"
            os = "Windows Server 2019"
            ip = "192.168.1.5"
            group = "Windows"

            [[default_passwords.logins]]
            username = "Administrator"
            password = "Changeme123!"

            [[env_login_templates]]
            service = "vcenter"
            url_template = "https://vcenter.team{team}.local"
            username_template = "blue{team}"
            password_template = "TEAM-secret"
        "#;

        let envinfo: EnvInfo = toml::from_str(toml_str).unwrap();
        assert_eq!(envinfo.service_ip_scheme.len(), 2);
        assert_eq!(envinfo.service_ip_scheme[0].nat_base, 39);
        assert!(envinfo.service_ip_scheme[0].nat_template.is_none());
        assert_eq!(envinfo.service_ip_scheme[1].nat_base, 0);
        assert_eq!(envinfo.default_passwords[0].box_name, "dc01");
        assert_eq!(envinfo.default_passwords[0].logins.len(), 1);
        assert_eq!(envinfo.env_login_templates[0].service, "vcenter");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let envinfo = load_envinfo("definitely/not/here/envinfo.toml").unwrap();
        assert!(envinfo.service_ip_scheme.is_empty());
        assert!(envinfo.default_passwords.is_empty());
    }
}
