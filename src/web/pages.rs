//! Server-rendered pages.

use super::{AppState, auth::Viewer, templates::Nav};
use crate::{
    core::{info, inject, scoring, user},
    entities::team,
    errors::{Error, Result},
};
use axum::{
    extract::{Path, State},
    response::Html,
};
use chrono::Utc;
use tera::Context;
use tracing::debug;

fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>> {
    Ok(Html(state.templates.render(template, context)?))
}

/// Syncs the viewer into the user table and returns their team, if any.
pub(crate) async fn viewer_team(state: &AppState, viewer: &Viewer) -> Result<Option<team::Model>> {
    if viewer.email.is_empty() {
        debug!(subject = %viewer.subject, "Viewer has no email claim, skipping user sync");
    } else {
        user::upsert_user(&state.db, &viewer.email, &viewer.name, &viewer.subject).await?;
    }
    user::team_for_subject(&state.db, &viewer.subject).await
}

/// GET / - the public scoreboard.
pub async fn homepage(
    State(state): State<AppState>,
    viewer: Option<Viewer>,
) -> Result<Html<String>> {
    let board = scoring::compute_scoreboard(&state.db).await?;

    let mut context = Context::new();
    context.insert("nav", &Nav::new("home", viewer.as_ref()));
    context.insert("board", &board);
    context.insert("auto_refresh", &state.config.auto_refresh_secs);
    render(&state, "index.html", &context)
}

/// GET /info - network addresses and credentials for the viewer's team.
pub async fn info_page(State(state): State<AppState>, viewer: Viewer) -> Result<Html<String>> {
    let team = viewer_team(&state, &viewer).await?;
    let info = info::build_info(&state.envinfo, team.as_ref().map(|t| t.id));

    let mut context = Context::new();
    context.insert("nav", &Nav::new("info", Some(&viewer)));
    context.insert("info", &info);
    render(&state, "info.html", &context)
}

/// GET /injects - released injects, newest first.
pub async fn injects_page(State(state): State<AppState>, viewer: Viewer) -> Result<Html<String>> {
    let injects = inject::visible_injects(&state.db, Utc::now(), viewer.is_admin).await?;

    let mut context = Context::new();
    context.insert("nav", &Nav::new("injects", Some(&viewer)));
    context.insert("injects", &injects);
    render(&state, "injects.html", &context)
}

/// GET /injects/{inject_id} - 404 for unknown and unreleased injects alike.
pub async fn inject_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(inject_id): Path<String>,
) -> Result<Html<String>> {
    let inject = inject::get_visible_inject(&state.db, &inject_id, Utc::now(), viewer.is_admin)
        .await?
        .ok_or_else(|| Error::not_found("Inject", &inject_id))?;

    let team = viewer_team(&state, &viewer).await?;
    let submissions = match &team {
        Some(team) => inject::list_team_submissions(&state.db, &inject.inject_id, team.id).await?,
        None => Vec::new(),
    };

    let mut context = Context::new();
    context.insert("nav", &Nav::new("injects", Some(&viewer)));
    context.insert("inject", &inject);
    context.insert("team", &team);
    context.insert("submissions", &submissions);
    render(&state, "inject.html", &context)
}
