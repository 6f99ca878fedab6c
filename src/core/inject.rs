//! Injects and team submissions.
//!
//! Every read that a team can reach goes through
//! [`visibility::is_inject_visible`], so the list, the detail page and the
//! submission endpoint cannot disagree about what has been released.

use crate::{
    core::{competition, visibility},
    entities::{Inject, InjectSubmission, inject, inject_submission},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// An inject as entered in the admin panel. `inject_id` is the business key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InjectDefinition {
    pub inject_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// Minutes after competition start
    #[serde(default)]
    pub release_time: i64,
    #[serde(default)]
    pub due_time: Option<String>,
}

/// A reviewer's verdict on a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Grade {
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Lists all injects, newest first, regardless of release.
pub async fn list_injects(db: &DatabaseConnection) -> Result<Vec<inject::Model>> {
    Inject::find()
        .order_by_desc(inject::Column::CreatedAt)
        .order_by_desc(inject::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_inject_by_inject_id(
    db: &DatabaseConnection,
    inject_id: &str,
) -> Result<Option<inject::Model>> {
    Inject::find()
        .filter(inject::Column::InjectId.eq(inject_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Injects this viewer may see at `now`, newest first.
#[instrument(skip(db))]
pub async fn visible_injects(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    is_admin: bool,
) -> Result<Vec<inject::Model>> {
    let injects = list_injects(db).await?;
    let competition = competition::get_competition(db).await?;

    Ok(injects
        .into_iter()
        .filter(|inject| {
            visibility::is_inject_visible(inject, competition.as_ref(), now, is_admin)
        })
        .collect())
}

/// Looks up an inject, treating an unreleased one the same as a missing one.
pub async fn get_visible_inject(
    db: &DatabaseConnection,
    inject_id: &str,
    now: DateTime<Utc>,
    is_admin: bool,
) -> Result<Option<inject::Model>> {
    let Some(inject) = get_inject_by_inject_id(db, inject_id).await? else {
        return Ok(None);
    };
    let competition = competition::get_competition(db).await?;

    Ok(
        visibility::is_inject_visible(&inject, competition.as_ref(), now, is_admin)
            .then_some(inject),
    )
}

/// Creates the inject, or overwrites the one with the same `inject_id`.
#[instrument(skip(db, definition), fields(inject_id = %definition.inject_id))]
pub async fn upsert_inject(
    db: &DatabaseConnection,
    definition: InjectDefinition,
) -> Result<inject::Model> {
    let inject_id = definition.inject_id.trim().to_string();
    if inject_id.is_empty() {
        return Err(Error::invalid("Inject id cannot be empty"));
    }
    if definition.title.trim().is_empty() {
        return Err(Error::invalid("Inject title cannot be empty"));
    }

    let saved = match get_inject_by_inject_id(db, &inject_id).await? {
        Some(existing) => {
            let mut active: inject::ActiveModel = existing.into();
            active.title = Set(definition.title.trim().to_string());
            active.description = Set(non_blank(definition.description));
            active.filename = Set(non_blank(definition.filename));
            active.release_time = Set(definition.release_time);
            active.due_time = Set(non_blank(definition.due_time));
            active.update(db).await?
        }
        None => {
            inject::ActiveModel {
                inject_id: Set(inject_id),
                title: Set(definition.title.trim().to_string()),
                description: Set(non_blank(definition.description)),
                filename: Set(non_blank(definition.filename)),
                release_time: Set(definition.release_time),
                due_time: Set(non_blank(definition.due_time)),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    info!(id = saved.id, release_time = saved.release_time, "Saved inject");
    Ok(saved)
}

/// Deletes an inject and all submissions made for it.
#[instrument(skip(db))]
pub async fn delete_inject(db: &DatabaseConnection, inject_id: &str) -> Result<()> {
    let inject = get_inject_by_inject_id(db, inject_id)
        .await?
        .ok_or_else(|| Error::not_found("Inject", inject_id))?;

    let txn = db.begin().await?;
    let submissions = InjectSubmission::delete_many()
        .filter(inject_submission::Column::InjectId.eq(inject.inject_id.as_str()))
        .exec(&txn)
        .await?;
    Inject::delete_by_id(inject.id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        submissions = submissions.rows_affected,
        "Deleted inject {}", inject.inject_id
    );
    Ok(())
}

/// Stored name for a submitted document.
#[must_use]
pub fn submission_filename(inject_id: &str, team_id: i64, at: DateTime<Utc>) -> String {
    format!("{inject_id}_team{team_id}_{}.pdf", at.timestamp())
}

/// Records a submission from `team_id`.
///
/// Answers [`Error::Forbidden`] when the inject does not exist or is not yet
/// released for this viewer, exactly like the detail page hides it.
#[instrument(skip(db))]
pub async fn submit_inject(
    db: &DatabaseConnection,
    inject_id: &str,
    team_id: i64,
    now: DateTime<Utc>,
    is_admin: bool,
) -> Result<inject_submission::Model> {
    let inject = get_visible_inject(db, inject_id, now, is_admin)
        .await?
        .ok_or_else(|| Error::Forbidden {
            reason: format!("inject {inject_id} is not available"),
        })?;

    let submission = inject_submission::ActiveModel {
        inject_id: Set(inject.inject_id.clone()),
        team_id: Set(team_id),
        filename: Set(submission_filename(&inject.inject_id, team_id, now)),
        submitted_at: Set(now),
        scored: Set(false),
        score: Set(None),
        reviewer: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        submission_id = submission.id,
        "Team {team_id} submitted {}", submission.filename
    );
    Ok(submission)
}

/// All submissions for an inject, newest first.
pub async fn list_submissions(
    db: &DatabaseConnection,
    inject_id: &str,
) -> Result<Vec<inject_submission::Model>> {
    InjectSubmission::find()
        .filter(inject_submission::Column::InjectId.eq(inject_id))
        .order_by_desc(inject_submission::Column::SubmittedAt)
        .order_by_desc(inject_submission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One team's submissions for an inject, newest first.
pub async fn list_team_submissions(
    db: &DatabaseConnection,
    inject_id: &str,
    team_id: i64,
) -> Result<Vec<inject_submission::Model>> {
    InjectSubmission::find()
        .filter(inject_submission::Column::InjectId.eq(inject_id))
        .filter(inject_submission::Column::TeamId.eq(team_id))
        .order_by_desc(inject_submission::Column::SubmittedAt)
        .order_by_desc(inject_submission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a submission as scored with the reviewer's verdict.
#[instrument(skip(db, grade))]
pub async fn grade_submission(
    db: &DatabaseConnection,
    submission_id: i64,
    grade: Grade,
) -> Result<inject_submission::Model> {
    if grade.score.is_some_and(|score| score < 0) {
        return Err(Error::invalid("Submission score cannot be negative"));
    }

    let submission = InjectSubmission::find_by_id(submission_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Submission", submission_id))?;

    let mut active: inject_submission::ActiveModel = submission.into();
    active.scored = Set(true);
    active.score = Set(grade.score);
    active.reviewer = Set(non_blank(grade.reviewer));
    active.notes = Set(non_blank(grade.notes));
    active.update(db).await.map_err(Into::into)
}
