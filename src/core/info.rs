//! Team-scoped environment info.
//!
//! Turns the static `envinfo.toml` description into what one team should see:
//! NAT addresses for its network, box credentials, and its environment logins.
//! Templated values are rendered with Tera, with `team` bound to the team id.

use crate::config::envinfo::{EnvInfo, LoginEntry, ServiceIp};
use serde::Serialize;
use std::collections::BTreeMap;
use tera::{Context, Tera};
use tracing::warn;

/// Group name for boxes that do not declare one.
pub const DEFAULT_PASSWORD_GROUP: &str = "Misc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAddress {
    pub service: String,
    pub internal: String,
    /// Empty when the viewer has no team or no NAT rule is configured
    pub nat: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxCredentials {
    pub box_name: String,
    pub os: String,
    pub ip: String,
    pub logins: Vec<LoginEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordGroup {
    pub group: String,
    pub boxes: Vec<BoxCredentials>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvLogin {
    pub service: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoView {
    pub team_id: Option<i64>,
    pub service_ips: Vec<ServiceAddress>,
    /// Sorted by group name
    pub password_groups: Vec<PasswordGroup>,
    pub env_logins: Vec<EnvLogin>,
}

fn render_template(raw: &str, team_id: i64) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("team", &team_id);
    Tera::one_off(raw, &context, false)
}

/// Renders `raw` if it contains a template expression; on failure the raw text is kept.
fn render_or_raw(raw: &str, team_id: i64) -> String {
    if !raw.contains("{{") {
        return raw.to_string();
    }
    render_template(raw, team_id).unwrap_or_else(|err| {
        warn!("Failed to render envinfo value {raw:?}: {err}");
        raw.to_string()
    })
}

/// NAT address of a service for `team_id`.
///
/// `nat_template` wins over the `prefix.(base + team).suffix` rule; a template
/// that fails to render yields an empty address.
#[must_use]
pub fn nat_address(scheme: &ServiceIp, team_id: i64) -> String {
    if let Some(template) = scheme.nat_template.as_deref().filter(|t| !t.is_empty()) {
        return render_template(template, team_id).unwrap_or_else(|err| {
            warn!(service = %scheme.service, "Failed to render NAT template: {err}");
            String::new()
        });
    }

    match scheme.nat_prefix.as_deref().filter(|p| !p.is_empty()) {
        Some(prefix) => format!(
            "{prefix}.{}.{}",
            scheme.nat_base + team_id,
            scheme.nat_suffix
        ),
        None => String::new(),
    }
}

/// Replaces the `{team}` and `TEAM` placeholders with the team id.
#[must_use]
pub fn replace_team_placeholder(template: &str, team_id: i64) -> String {
    let team = team_id.to_string();
    template.replace("{team}", &team).replace("TEAM", &team)
}

/// Builds the info page content for a viewer on `team_id` (or on no team).
#[must_use]
pub fn build_info(envinfo: &EnvInfo, team_id: Option<i64>) -> InfoView {
    let render_team = team_id.unwrap_or(0);

    let service_ips = envinfo
        .service_ip_scheme
        .iter()
        .map(|scheme| ServiceAddress {
            service: scheme.service.clone(),
            internal: scheme.internal_ip.clone(),
            nat: team_id
                .filter(|id| *id > 0)
                .map(|id| nat_address(scheme, id))
                .unwrap_or_default(),
        })
        .collect();

    let mut groups: BTreeMap<String, Vec<BoxCredentials>> = BTreeMap::new();
    for entry in &envinfo.default_passwords {
        let group = entry
            .group
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or(DEFAULT_PASSWORD_GROUP)
            .to_string();
        groups.entry(group).or_default().push(BoxCredentials {
            box_name: render_or_raw(&entry.box_name, render_team),
            os: render_or_raw(&entry.os, render_team),
            ip: render_or_raw(&entry.ip, render_team),
            logins: entry
                .logins
                .iter()
                .map(|login| LoginEntry {
                    username: render_or_raw(&login.username, render_team),
                    password: render_or_raw(&login.password, render_team),
                    notes: login.notes.clone(),
                })
                .collect(),
        });
    }

    let env_logins = match team_id {
        Some(id) if id != 0 => envinfo
            .env_login_templates
            .iter()
            .map(|template| EnvLogin {
                service: template.service.clone(),
                url: replace_team_placeholder(&template.url_template, id),
                username: replace_team_placeholder(&template.username_template, id),
                password: replace_team_placeholder(&template.password_template, id),
            })
            .collect(),
        _ => Vec::new(),
    };

    InfoView {
        team_id,
        service_ips,
        password_groups: groups
            .into_iter()
            .map(|(group, boxes)| PasswordGroup { group, boxes })
            .collect(),
        env_logins,
    }
}
