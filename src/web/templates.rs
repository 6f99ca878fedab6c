//! HTML templates, compiled into the binary.

use crate::errors::Result;
use serde::Serialize;
use tera::Tera;

use super::auth::Viewer;

/// Builds the template set used by every page.
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("templates/base.html")),
        ("index.html", include_str!("templates/index.html")),
        ("info.html", include_str!("templates/info.html")),
        ("injects.html", include_str!("templates/injects.html")),
        ("inject.html", include_str!("templates/inject.html")),
    ])?;
    Ok(tera)
}

/// Navbar state shared by every page.
#[derive(Debug, Clone, Serialize)]
pub struct Nav {
    pub active: &'static str,
    pub is_logged_in: bool,
    pub is_admin: bool,
    pub user_name: String,
}

impl Nav {
    #[must_use]
    pub fn new(active: &'static str, viewer: Option<&Viewer>) -> Self {
        Self {
            active,
            is_logged_in: viewer.is_some(),
            is_admin: viewer.is_some_and(|v| v.is_admin),
            user_name: viewer.map(|v| v.name.clone()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() -> Result<()> {
        let tera = load_templates()?;
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"inject.html"));
        Ok(())
    }
}
