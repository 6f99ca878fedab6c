//! Competition lifecycle and the scoring fact tables.
//!
//! Owns the singleton competition row, the append-only check records and score
//! adjustments, and the reset that clears them between events.

use crate::{
    core::{scoring::MAX_ROUND, visibility},
    entities::{
        Competition, CompetitionScore, CompetitionService, CompetitionStatus, Service, Team,
        competition, competition_score, competition_service,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// New competition settings; blank times are stored as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompetitionUpdate {
    pub status: CompetitionStatus,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub started_time: Option<String>,
    #[serde(default)]
    pub stopped_time: Option<String>,
}

/// One check outcome reported by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckResult {
    pub team_id: i64,
    pub service_id: i64,
    pub round: i64,
    pub is_up: bool,
    #[serde(default)]
    pub output: Option<String>,
}

/// Returns the current competition, creating a stopped one on first access.
pub async fn get_or_create_competition(db: &DatabaseConnection) -> Result<competition::Model> {
    if let Some(existing) = get_competition(db).await? {
        return Ok(existing);
    }

    info!("No competition row yet, creating a stopped one");
    competition::ActiveModel {
        status: Set(CompetitionStatus::Stopped),
        scheduled_time: Set(None),
        started_time: Set(None),
        stopped_time: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Returns the current competition without creating one.
pub async fn get_competition(db: &DatabaseConnection) -> Result<Option<competition::Model>> {
    Competition::find()
        .order_by_desc(competition::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[instrument(skip(db))]
pub async fn update_competition(
    db: &DatabaseConnection,
    update: CompetitionUpdate,
) -> Result<competition::Model> {
    let existing = get_or_create_competition(db).await?;

    let mut active: competition::ActiveModel = existing.into();
    active.status = Set(update.status);
    active.scheduled_time = Set(non_blank(update.scheduled_time));
    active.started_time = Set(non_blank(update.started_time));
    active.stopped_time = Set(non_blank(update.stopped_time));
    let updated = active.update(db).await?;

    if updated.started_time.is_some() && visibility::started_at(&updated).is_none() {
        warn!(
            started_time = ?updated.started_time,
            "Competition start time is not RFC 3339; timed injects stay hidden"
        );
    }
    info!(status = ?updated.status, "Updated competition");
    Ok(updated)
}

/// Deletes every check record and score adjustment, then stops the
/// competition and clears its times. Runs as one transaction.
#[instrument(skip(db))]
pub async fn reset_competition(db: &DatabaseConnection) -> Result<()> {
    get_or_create_competition(db).await?;

    let txn = db.begin().await?;
    let adjustments = CompetitionScore::delete_many().exec(&txn).await?;
    let records = CompetitionService::delete_many().exec(&txn).await?;
    Competition::update_many()
        .col_expr(
            competition::Column::Status,
            Expr::value(CompetitionStatus::Stopped),
        )
        .col_expr(
            competition::Column::ScheduledTime,
            Expr::value(Option::<String>::None),
        )
        .col_expr(
            competition::Column::StartedTime,
            Expr::value(Option::<String>::None),
        )
        .col_expr(
            competition::Column::StoppedTime,
            Expr::value(Option::<String>::None),
        )
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!(
        adjustments = adjustments.rows_affected,
        records = records.rows_affected,
        "Reset competition scoring data"
    );
    Ok(())
}

/// Check records, optionally narrowed to one team and/or one service,
/// ordered by round then timestamp.
pub async fn service_history(
    db: &DatabaseConnection,
    team_id: Option<i64>,
    service_id: Option<i64>,
) -> Result<Vec<competition_service::Model>> {
    let mut query = CompetitionService::find();
    if let Some(team_id) = team_id {
        query = query.filter(competition_service::Column::TeamId.eq(team_id));
    }
    if let Some(service_id) = service_id {
        query = query.filter(competition_service::Column::ServiceId.eq(service_id));
    }

    query
        .order_by_asc(competition_service::Column::Round)
        .order_by_asc(competition_service::Column::Timestamp)
        .order_by_asc(competition_service::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stores a check outcome for an existing team and service.
#[instrument(skip(db, result), fields(team_id = result.team_id, service_id = result.service_id, round = result.round))]
pub async fn record_check_result(
    db: &DatabaseConnection,
    result: CheckResult,
) -> Result<competition_service::Model> {
    if Team::find_by_id(result.team_id).one(db).await?.is_none() {
        return Err(Error::not_found("Team", result.team_id));
    }
    if Service::find_by_id(result.service_id).one(db).await?.is_none() {
        return Err(Error::not_found("Service", result.service_id));
    }
    if result.round < 0 {
        return Err(Error::invalid("Round cannot be negative"));
    }
    if result.round > MAX_ROUND {
        return Err(Error::invalid(format!("Round cannot exceed {MAX_ROUND}")));
    }

    competition_service::ActiveModel {
        team_id: Set(result.team_id),
        service_id: Set(result.service_id),
        is_up: Set(result.is_up),
        output: Set(result.output),
        round: Set(result.round),
        timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Adds a score delta for a team. Penalties are negative.
///
/// Only a positive `round` is stored; anything else records a manual
/// adjustment that counts towards the total but not towards any round.
/// Rounds past [`MAX_ROUND`] are rejected.
#[instrument(skip(db, description))]
pub async fn add_score_adjustment(
    db: &DatabaseConnection,
    team_id: i64,
    score: i64,
    round: Option<i64>,
    description: Option<String>,
) -> Result<competition_score::Model> {
    if Team::find_by_id(team_id).one(db).await?.is_none() {
        return Err(Error::not_found("Team", team_id));
    }
    if round.is_some_and(|round| round > MAX_ROUND) {
        return Err(Error::invalid(format!("Round cannot exceed {MAX_ROUND}")));
    }

    let adjustment = competition_score::ActiveModel {
        team_id: Set(team_id),
        score: Set(score),
        round: Set(round.filter(|round| *round > 0)),
        description: Set(non_blank(description)),
        timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(adjustment_id = adjustment.id, "Recorded score adjustment");
    Ok(adjustment)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_or_create_is_stable() -> Result<()> {
        let db = setup_test_db().await?;

        let first = get_or_create_competition(&db).await?;
        let second = get_or_create_competition(&db).await?;

        assert_eq!(first, second);
        assert_eq!(first.status, CompetitionStatus::Stopped);
        assert!(first.started_time.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_competition_blanks_become_unset() -> Result<()> {
        let db = setup_test_db().await?;

        let updated = update_competition(
            &db,
            CompetitionUpdate {
                status: CompetitionStatus::Running,
                scheduled_time: Some("  ".to_string()),
                started_time: Some(" 2024-01-01T09:00:00Z ".to_string()),
                stopped_time: None,
            },
        )
        .await?;

        assert_eq!(updated.status, CompetitionStatus::Running);
        assert_eq!(updated.scheduled_time, None);
        assert_eq!(updated.started_time.as_deref(), Some("2024-01-01T09:00:00Z"));
        assert_eq!(get_competition(&db).await?, Some(updated));

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_competition() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let web = create_test_service(&db, "web").await?;
        create_test_check(&db, team.id, web.id, 1, true).await?;
        create_test_adjustment(&db, team.id, 10, Some(1)).await?;
        update_competition(
            &db,
            CompetitionUpdate {
                status: CompetitionStatus::Running,
                started_time: Some("2024-01-01T09:00:00Z".to_string()),
                ..Default::default()
            },
        )
        .await?;

        reset_competition(&db).await?;

        assert!(service_history(&db, None, None).await?.is_empty());
        assert!(CompetitionScore::find().all(&db).await?.is_empty());
        let competition = get_or_create_competition(&db).await?;
        assert_eq!(competition.status, CompetitionStatus::Stopped);
        assert!(competition.started_time.is_none());
        // configuration survives
        assert_eq!(Team::find().all(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_service_history_filters_and_order() -> Result<()> {
        let db = setup_test_db().await?;
        let alpha = create_test_team(&db, "Alpha").await?;
        let bravo = create_test_team(&db, "Bravo").await?;
        let web = create_test_service(&db, "web").await?;
        let ssh = create_test_service(&db, "ssh").await?;
        create_test_check(&db, alpha.id, web.id, 2, true).await?;
        create_test_check(&db, alpha.id, web.id, 1, false).await?;
        create_test_check(&db, alpha.id, ssh.id, 1, true).await?;
        create_test_check(&db, bravo.id, web.id, 1, true).await?;

        let all = service_history(&db, None, None).await?;
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].round <= w[1].round));

        let alpha_web = service_history(&db, Some(alpha.id), Some(web.id)).await?;
        let rounds: Vec<i64> = alpha_web.iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![1, 2]);

        assert_eq!(service_history(&db, None, Some(ssh.id)).await?.len(), 1);
        assert_eq!(service_history(&db, Some(bravo.id), None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_check_result_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let web = create_test_service(&db, "web").await?;

        let missing_service = record_check_result(
            &db,
            CheckResult {
                team_id: team.id,
                service_id: 99,
                round: 1,
                is_up: true,
                output: None,
            },
        )
        .await;
        assert!(matches!(missing_service, Err(Error::NotFound { .. })));

        let stored = record_check_result(
            &db,
            CheckResult {
                team_id: team.id,
                service_id: web.id,
                round: 3,
                is_up: false,
                output: Some("connection refused".to_string()),
            },
        )
        .await?;
        assert_eq!(stored.round, 3);
        assert_eq!(stored.output.as_deref(), Some("connection refused"));

        let too_late = record_check_result(
            &db,
            CheckResult {
                team_id: team.id,
                service_id: web.id,
                round: MAX_ROUND + 1,
                is_up: true,
                output: None,
            },
        )
        .await;
        assert!(matches!(too_late, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_score_adjustment_round_handling() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;

        let per_round = add_score_adjustment(&db, team.id, 5, Some(2), None).await?;
        let manual = add_score_adjustment(&db, team.id, -20, Some(0), Some("SLA".to_string())).await?;
        let unset = add_score_adjustment(&db, team.id, 3, None, Some("  ".to_string())).await?;

        assert_eq!(per_round.round, Some(2));
        assert_eq!(manual.round, None);
        assert_eq!(manual.score, -20);
        assert_eq!(unset.round, None);
        assert_eq!(unset.description, None);

        let result = add_score_adjustment(&db, 404, 1, None, None).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let last = add_score_adjustment(&db, team.id, 1, Some(MAX_ROUND), None).await?;
        assert_eq!(last.round, Some(MAX_ROUND));
        let result = add_score_adjustment(&db, team.id, 5, Some(i64::MAX), None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }
}
