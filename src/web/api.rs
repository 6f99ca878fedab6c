//! JSON endpoints: the public scoreboard, team submissions and the admin API.

use super::{
    AppState,
    auth::{AdminViewer, Viewer},
    pages::viewer_team,
};
use crate::{
    core::{
        competition::{self, CheckResult, CompetitionUpdate},
        inject::{self, Grade, InjectDefinition},
        scoring::{self, ScoreboardView},
        scoring_box,
        service::{self, ServiceDefinition, ServiceDetails},
        team,
        user::{self, UserWithTeam},
    },
    entities::{
        competition as competition_entity, competition_score, competition_service,
        inject as inject_entity, inject_submission, scoring_box as box_entity, team as team_entity,
        team_member,
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// GET /api/scoreboard
pub async fn scoreboard(State(state): State<AppState>) -> Result<Json<ScoreboardView>> {
    Ok(Json(scoring::compute_scoreboard(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    /// Name of the document as uploaded by the team
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub id: i64,
    pub inject_id: String,
    pub filename: String,
    pub original: String,
    pub submitted_at: DateTime<Utc>,
}

/// POST /api/injects/{inject_id}/submissions
///
/// 403 when the inject is missing or unreleased, or the viewer has no team.
pub async fn submit_inject(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(inject_id): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionReceipt>)> {
    let original = request.filename.trim().to_string();
    if !original.to_ascii_lowercase().ends_with(".pdf") {
        return Err(Error::invalid("Submissions must be PDF documents"));
    }

    let team = viewer_team(&state, &viewer)
        .await?
        .ok_or_else(|| Error::Forbidden {
            reason: "you are not on a team".to_string(),
        })?;

    let submission =
        inject::submit_inject(&state.db, &inject_id, team.id, Utc::now(), viewer.is_admin).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionReceipt {
            id: submission.id,
            inject_id: submission.inject_id,
            filename: submission.filename,
            original,
            submitted_at: submission.submitted_at,
        }),
    ))
}

// Teams

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    pub name: String,
}

pub async fn list_teams(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<Vec<team_entity::Model>>> {
    Ok(Json(team::list_teams(&state.db).await?))
}

pub async fn create_team(
    State(state): State<AppState>,
    AdminViewer(admin): AdminViewer,
    Json(request): Json<TeamRequest>,
) -> Result<(StatusCode, Json<team_entity::Model>)> {
    let created = team::create_team(&state.db, &request.name).await?;
    info!(admin = %admin.name, team_id = created.id, "Team created via admin API");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn rename_team(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(team_id): Path<i64>,
    Json(request): Json<TeamRequest>,
) -> Result<Json<team_entity::Model>> {
    Ok(Json(team::rename_team(&state.db, team_id, &request.name).await?))
}

pub async fn delete_team(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(team_id): Path<i64>,
) -> Result<StatusCode> {
    team::delete_team(&state.db, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Users and memberships

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub team_id: i64,
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<Vec<UserWithTeam>>> {
    Ok(Json(user::list_users_with_team(&state.db).await?))
}

pub async fn set_membership(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(user_id): Path<i64>,
    Json(request): Json<MembershipRequest>,
) -> Result<Json<team_member::Model>> {
    Ok(Json(
        user::set_membership(&state.db, user_id, request.team_id).await?,
    ))
}

pub async fn remove_membership(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(user_id): Path<i64>,
) -> Result<StatusCode> {
    user::remove_membership(&state.db, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Services and boxes

pub async fn list_services(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<Vec<ServiceDetails>>> {
    Ok(Json(service::list_service_details(&state.db).await?))
}

pub async fn save_service(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(definition): Json<ServiceDefinition>,
) -> Result<Json<ServiceDetails>> {
    Ok(Json(service::save_service(&state.db, definition).await?))
}

pub async fn delete_service(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(service_id): Path<i64>,
) -> Result<StatusCode> {
    service::delete_service(&state.db, service_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct BoxRequest {
    #[serde(default)]
    pub id: Option<i64>,
    pub team_id: i64,
    pub ip_address: String,
    #[serde(default)]
    pub service_id: Option<i64>,
}

pub async fn list_boxes(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<Vec<box_entity::Model>>> {
    Ok(Json(scoring_box::list_boxes(&state.db).await?))
}

pub async fn save_box(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(request): Json<BoxRequest>,
) -> Result<Json<box_entity::Model>> {
    let saved = scoring_box::save_box(
        &state.db,
        request.id,
        request.team_id,
        &request.ip_address,
        request.service_id,
    )
    .await?;
    Ok(Json(saved))
}

pub async fn delete_box(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(box_id): Path<i64>,
) -> Result<StatusCode> {
    scoring_box::delete_box(&state.db, box_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Competition and scoring data

pub async fn get_competition(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<competition_entity::Model>> {
    Ok(Json(competition::get_or_create_competition(&state.db).await?))
}

pub async fn update_competition(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(update): Json<CompetitionUpdate>,
) -> Result<Json<competition_entity::Model>> {
    Ok(Json(competition::update_competition(&state.db, update).await?))
}

pub async fn reset_competition(
    State(state): State<AppState>,
    AdminViewer(admin): AdminViewer,
) -> Result<StatusCode> {
    competition::reset_competition(&state.db).await?;
    info!(admin = %admin.name, "Competition reset via admin API");
    Ok(StatusCode::NO_CONTENT)
}

/// Filters for the service matrix; `0` means "any", like an absent value.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub service_id: Option<i64>,
}

pub async fn service_history(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<competition_service::Model>>> {
    let team_id = query.team_id.filter(|id| *id != 0);
    let service_id = query.service_id.filter(|id| *id != 0);
    Ok(Json(
        competition::service_history(&state.db, team_id, service_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    pub team_id: i64,
    pub score: i64,
    #[serde(default)]
    pub round: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn add_adjustment(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(request): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<competition_score::Model>)> {
    let adjustment = competition::add_score_adjustment(
        &state.db,
        request.team_id,
        request.score,
        request.round,
        request.description,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

pub async fn record_check(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(result): Json<CheckResult>,
) -> Result<(StatusCode, Json<competition_service::Model>)> {
    let record = competition::record_check_result(&state.db, result).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

// Injects

pub async fn list_injects(
    State(state): State<AppState>,
    _admin: AdminViewer,
) -> Result<Json<Vec<inject_entity::Model>>> {
    Ok(Json(inject::list_injects(&state.db).await?))
}

pub async fn save_inject(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Json(definition): Json<InjectDefinition>,
) -> Result<Json<inject_entity::Model>> {
    Ok(Json(inject::upsert_inject(&state.db, definition).await?))
}

pub async fn delete_inject(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(inject_id): Path<String>,
) -> Result<StatusCode> {
    inject::delete_inject(&state.db, &inject_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_submissions(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(inject_id): Path<String>,
) -> Result<Json<Vec<inject_submission::Model>>> {
    Ok(Json(inject::list_submissions(&state.db, &inject_id).await?))
}

pub async fn grade_submission(
    State(state): State<AppState>,
    _admin: AdminViewer,
    Path(submission_id): Path<i64>,
    Json(grade): Json<Grade>,
) -> Result<Json<inject_submission::Model>> {
    Ok(Json(
        inject::grade_submission(&state.db, submission_id, grade).await?,
    ))
}
