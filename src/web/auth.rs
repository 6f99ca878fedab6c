//! Viewer identity from the authenticating reverse proxy.
//!
//! The proxy performs the OpenID Connect login and forwards the resulting
//! claims as request headers. Requests without a subject header are anonymous.

use super::AppState;
use crate::errors::Error;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use serde::Serialize;

pub const SUBJECT_HEADER: &str = "x-forwarded-user";
pub const EMAIL_HEADER: &str = "x-forwarded-email";
pub const NAME_HEADER: &str = "x-forwarded-preferred-username";
pub const GROUPS_HEADER: &str = "x-forwarded-groups";

/// A logged-in viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Viewer {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub groups: Vec<String>,
    pub is_admin: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Viewer {
    /// Reads the forwarded identity; `None` when no subject is present.
    ///
    /// A viewer is an administrator iff `admin_group` is set and listed in
    /// the comma-separated groups header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, admin_group: Option<&str>) -> Option<Self> {
        let subject = header(headers, SUBJECT_HEADER)?.to_string();
        let email = header(headers, EMAIL_HEADER).unwrap_or_default().to_string();
        let name = header(headers, NAME_HEADER)
            .map(ToString::to_string)
            .unwrap_or_else(|| if email.is_empty() { subject.clone() } else { email.clone() });
        let groups: Vec<String> = header(headers, GROUPS_HEADER)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|group| !group.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let is_admin = admin_group
            .filter(|group| !group.is_empty())
            .is_some_and(|admin| groups.iter().any(|group| group == admin));

        Some(Self {
            subject,
            email,
            name,
            groups,
            is_admin,
        })
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, state.config.admin_group.as_deref())
            .ok_or(Error::Unauthorized)
    }
}

/// A viewer that passed the admin check.
#[derive(Debug, Clone)]
pub struct AdminViewer(pub Viewer);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminViewer {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state).await?;
        if !viewer.is_admin {
            return Err(Error::Forbidden {
                reason: "administrators only".to_string(),
            });
        }
        Ok(Self(viewer))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_anonymous_without_subject() {
        assert!(Viewer::from_headers(&HeaderMap::new(), Some("admins")).is_none());
        let blank = headers(&[(SUBJECT_HEADER, "  ")]);
        assert!(Viewer::from_headers(&blank, Some("admins")).is_none());
    }

    #[test]
    fn test_viewer_fields_and_admin_group() {
        let map = headers(&[
            (SUBJECT_HEADER, "sub-1"),
            (EMAIL_HEADER, "ana@example.edu"),
            (NAME_HEADER, "ana"),
            (GROUPS_HEADER, "blue, white-cell ,"),
        ]);

        let viewer = Viewer::from_headers(&map, Some("white-cell")).unwrap();
        assert_eq!(viewer.subject, "sub-1");
        assert_eq!(viewer.name, "ana");
        assert_eq!(viewer.groups, vec!["blue", "white-cell"]);
        assert!(viewer.is_admin);

        assert!(!Viewer::from_headers(&map, Some("red")).unwrap().is_admin);
        assert!(!Viewer::from_headers(&map, None).unwrap().is_admin);
        assert!(!Viewer::from_headers(&map, Some("")).unwrap().is_admin);
    }

    #[test]
    fn test_name_falls_back_to_email() {
        let map = headers(&[(SUBJECT_HEADER, "sub-1"), (EMAIL_HEADER, "ana@example.edu")]);
        let viewer = Viewer::from_headers(&map, None).unwrap();
        assert_eq!(viewer.name, "ana@example.edu");
    }
}
