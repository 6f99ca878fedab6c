//! Team business logic - Creating, renaming and removing competing teams.

use crate::{
    entities::{
        CompetitionScore, CompetitionService, InjectSubmission, ScoringBox, Team, TeamMember,
        competition_score, competition_service, inject_submission, scoring_box, team, team_member,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Lists all teams in creation order, which is also their scoreboard order.
pub async fn list_teams(db: &DatabaseConnection) -> Result<Vec<team::Model>> {
    Team::find()
        .order_by_asc(team::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_team_by_id(db: &DatabaseConnection, team_id: i64) -> Result<Option<team::Model>> {
    Team::find_by_id(team_id).one(db).await.map_err(Into::into)
}

pub async fn get_team_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<team::Model>> {
    Team::find()
        .filter(team::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

fn validated_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid("Team name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Creates a team; names are trimmed and must be unique.
#[instrument(skip(db))]
pub async fn create_team(db: &DatabaseConnection, name: &str) -> Result<team::Model> {
    let name = validated_name(name)?;
    if get_team_by_name(db, &name).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("Team '{name}' already exists"),
        });
    }

    let team = team::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(team_id = team.id, "Created team {}", team.name);
    Ok(team)
}

#[instrument(skip(db))]
pub async fn rename_team(db: &DatabaseConnection, team_id: i64, name: &str) -> Result<team::Model> {
    let name = validated_name(name)?;
    let team = get_team_by_id(db, team_id)
        .await?
        .ok_or_else(|| Error::not_found("Team", team_id))?;

    let taken = get_team_by_name(db, &name).await?;
    if taken.is_some_and(|existing| existing.id != team_id) {
        return Err(Error::Conflict {
            message: format!("Team '{name}' already exists"),
        });
    }

    let mut active: team::ActiveModel = team.into();
    active.name = Set(name);
    active.update(db).await.map_err(Into::into)
}

/// Deletes a team together with its memberships and boxes.
///
/// Refused with a conflict while check records, score adjustments or inject
/// submissions still reference the team.
#[instrument(skip(db))]
pub async fn delete_team(db: &DatabaseConnection, team_id: i64) -> Result<()> {
    let team = get_team_by_id(db, team_id)
        .await?
        .ok_or_else(|| Error::not_found("Team", team_id))?;

    let records = CompetitionService::find()
        .filter(competition_service::Column::TeamId.eq(team_id))
        .count(db)
        .await?;
    let adjustments = CompetitionScore::find()
        .filter(competition_score::Column::TeamId.eq(team_id))
        .count(db)
        .await?;
    let submissions = InjectSubmission::find()
        .filter(inject_submission::Column::TeamId.eq(team_id))
        .count(db)
        .await?;
    if records + adjustments + submissions > 0 {
        return Err(Error::Conflict {
            message: format!("Team '{}' has scoring data; reset the competition first", team.name),
        });
    }

    let txn = db.begin().await?;
    TeamMember::delete_many()
        .filter(team_member::Column::TeamId.eq(team_id))
        .exec(&txn)
        .await?;
    ScoringBox::delete_many()
        .filter(scoring_box::Column::TeamId.eq(team_id))
        .exec(&txn)
        .await?;
    Team::delete_by_id(team_id).exec(&txn).await?;
    txn.commit().await?;

    info!(team_id, "Deleted team {}", team.name);
    Ok(())
}
