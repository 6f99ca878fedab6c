//! Users and team membership.
//!
//! Users come from the identity headers of the authenticating proxy and are
//! synced on access. A user belongs to at most one team.

use crate::{
    entities::{Team, TeamMember, User, team, team_member, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// A user row joined with their team, for the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithTeam {
    #[serde(flatten)]
    pub user: user::Model,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

/// Inserts the user or refreshes its name and subject, keyed by email.
#[instrument(skip(db, name, subject))]
pub async fn upsert_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    subject: &str,
) -> Result<user::Model> {
    let email = email.trim();
    if email.is_empty() || subject.trim().is_empty() {
        return Err(Error::invalid("Users need an email and a subject"));
    }

    let existing = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;

    match existing {
        Some(current) if current.name == name && current.subject == subject => Ok(current),
        Some(current) => {
            let mut active: user::ActiveModel = current.into();
            active.name = Set(name.to_string());
            active.subject = Set(subject.to_string());
            let updated = active.update(db).await?;
            debug!(user_id = updated.id, "Refreshed user");
            Ok(updated)
        }
        None => {
            let created = user::ActiveModel {
                email: Set(email.to_string()),
                name: Set(name.to_string()),
                subject: Set(subject.to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(user_id = created.id, "Registered user {email}");
            Ok(created)
        }
    }
}

/// The team of the user with this identity-provider subject, if any.
pub async fn team_for_subject(db: &DatabaseConnection, subject: &str) -> Result<Option<team::Model>> {
    let Some(user) = User::find()
        .filter(user::Column::Subject.eq(subject))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let Some(membership) = TeamMember::find()
        .filter(team_member::Column::UserId.eq(user.id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    Team::find_by_id(membership.team_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Puts a user on a team, moving them off any previous team.
#[instrument(skip(db))]
pub async fn set_membership(
    db: &DatabaseConnection,
    user_id: i64,
    team_id: i64,
) -> Result<team_member::Model> {
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(Error::not_found("User", user_id));
    }
    if Team::find_by_id(team_id).one(db).await?.is_none() {
        return Err(Error::not_found("Team", team_id));
    }

    let txn = db.begin().await?;
    TeamMember::delete_many()
        .filter(team_member::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let membership = team_member::ActiveModel {
        team_id: Set(team_id),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(user_id, team_id, "Assigned user to team");
    Ok(membership)
}

#[instrument(skip(db))]
pub async fn remove_membership(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let result = TeamMember::delete_many()
        .filter(team_member::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Membership", user_id));
    }
    Ok(())
}

/// Lists every user by email, with the team they are on.
pub async fn list_users_with_team(db: &DatabaseConnection) -> Result<Vec<UserWithTeam>> {
    let users = User::find().order_by_asc(user::Column::Email).all(db).await?;
    let memberships: HashMap<i64, i64> = TeamMember::find()
        .all(db)
        .await?
        .into_iter()
        .map(|membership| (membership.user_id, membership.team_id))
        .collect();
    let teams: HashMap<i64, String> = Team::find()
        .all(db)
        .await?
        .into_iter()
        .map(|team| (team.id, team.name))
        .collect();

    Ok(users
        .into_iter()
        .map(|user| {
            let team_id = memberships.get(&user.id).copied();
            UserWithTeam {
                team_name: team_id.and_then(|id| teams.get(&id).cloned()),
                team_id,
                user,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_upsert_user_by_email() -> Result<()> {
        let db = setup_test_db().await?;

        let created = upsert_user(&db, "ana@example.edu", "Ana", "sub-1").await?;
        let same = upsert_user(&db, "ana@example.edu", "Ana", "sub-1").await?;
        assert_eq!(created, same);

        let renamed = upsert_user(&db, "ana@example.edu", "Ana B.", "sub-1").await?;
        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.name, "Ana B.");

        let result = upsert_user(&db, "", "Nobody", "sub-2").await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_team_for_subject() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let user = upsert_user(&db, "ana@example.edu", "Ana", "sub-1").await?;

        assert!(team_for_subject(&db, "sub-1").await?.is_none());
        assert!(team_for_subject(&db, "unknown").await?.is_none());

        set_membership(&db, user.id, team.id).await?;
        assert_eq!(team_for_subject(&db, "sub-1").await?, Some(team));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_membership_moves_user() -> Result<()> {
        let db = setup_test_db().await?;
        let alpha = create_test_team(&db, "Alpha").await?;
        let bravo = create_test_team(&db, "Bravo").await?;
        let user = upsert_user(&db, "ana@example.edu", "Ana", "sub-1").await?;

        set_membership(&db, user.id, alpha.id).await?;
        set_membership(&db, user.id, bravo.id).await?;

        let listed = list_users_with_team(&db).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].team_id, Some(bravo.id));
        assert_eq!(listed[0].team_name.as_deref(), Some("Bravo"));

        remove_membership(&db, user.id).await?;
        let listed = list_users_with_team(&db).await?;
        assert_eq!(listed[0].team_id, None);
        assert!(matches!(
            remove_membership(&db, user.id).await,
            Err(Error::NotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_membership_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;

        let result = set_membership(&db, 77, team.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
