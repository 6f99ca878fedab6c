//! Scored boxes - The per-team hosts the checker targets.

use crate::{
    entities::{ScoringBox, Service, Team, scoring_box},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Lists every box ordered by team, then id.
pub async fn list_boxes(db: &DatabaseConnection) -> Result<Vec<scoring_box::Model>> {
    ScoringBox::find()
        .order_by_asc(scoring_box::Column::TeamId)
        .order_by_asc(scoring_box::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a box when `box_id` is `None`, otherwise updates that box.
///
/// The team (and the service, when given) must exist.
#[instrument(skip(db))]
pub async fn save_box(
    db: &DatabaseConnection,
    box_id: Option<i64>,
    team_id: i64,
    ip_address: &str,
    service_id: Option<i64>,
) -> Result<scoring_box::Model> {
    let ip_address = ip_address.trim();
    if ip_address.is_empty() {
        return Err(Error::invalid("Box IP address cannot be empty"));
    }
    if Team::find_by_id(team_id).one(db).await?.is_none() {
        return Err(Error::not_found("Team", team_id));
    }
    if let Some(service_id) = service_id {
        if Service::find_by_id(service_id).one(db).await?.is_none() {
            return Err(Error::not_found("Service", service_id));
        }
    }

    let saved = match box_id {
        Some(id) => {
            let existing = ScoringBox::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("Box", id))?;
            let mut active: scoring_box::ActiveModel = existing.into();
            active.team_id = Set(team_id);
            active.ip_address = Set(ip_address.to_string());
            active.service_id = Set(service_id);
            active.update(db).await?
        }
        None => {
            scoring_box::ActiveModel {
                team_id: Set(team_id),
                ip_address: Set(ip_address.to_string()),
                service_id: Set(service_id),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    info!(box_id = saved.id, team_id, "Saved box {}", saved.ip_address);
    Ok(saved)
}

#[instrument(skip(db))]
pub async fn delete_box(db: &DatabaseConnection, box_id: i64) -> Result<()> {
    let result = ScoringBox::delete_by_id(box_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Box", box_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_save_and_update_box() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let web = create_test_service(&db, "web").await?;

        let created = save_box(&db, None, team.id, " 10.0.1.10 ", Some(web.id)).await?;
        assert_eq!(created.ip_address, "10.0.1.10");

        let updated = save_box(&db, Some(created.id), team.id, "10.0.1.11", None).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.service_id, None);
        assert_eq!(list_boxes(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_save_box_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;

        let result = save_box(&db, None, team.id, "", None).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = save_box(&db, None, 42, "10.0.0.1", None).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let result = save_box(&db, None, team.id, "10.0.0.1", Some(42)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_box() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let created = save_box(&db, None, team.id, "10.0.1.10", None).await?;

        delete_box(&db, created.id).await?;
        assert!(list_boxes(&db).await?.is_empty());

        let result = delete_box(&db, created.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
