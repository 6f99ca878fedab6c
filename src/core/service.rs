//! Service configuration - Scored services with their checks and regexes.
//!
//! A service is saved as a whole: the submitted check list replaces the stored
//! one, so check and regex ids are not stable across saves.

use crate::{
    entities::{
        CompetitionService, RegexCheck, ScoringBox, Service, ServiceCheck, competition_service,
        regex_check, scoring_box, service, service_check,
    },
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A service as submitted by the admin panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceDefinition {
    /// Existing service to update; `None` creates a new one
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckDefinition {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub regexes: Vec<RegexDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegexDefinition {
    pub pattern: String,
    #[serde(default = "default_expected")]
    pub expected: bool,
}

const fn default_expected() -> bool {
    true
}

/// A stored service with its checks, each with its regexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDetails {
    #[serde(flatten)]
    pub service: service::Model,
    pub checks: Vec<CheckDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDetails {
    #[serde(flatten)]
    pub check: service_check::Model,
    pub regexes: Vec<regex_check::Model>,
}

pub async fn list_services(db: &DatabaseConnection) -> Result<Vec<service::Model>> {
    Service::find()
        .order_by_asc(service::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_service_by_id(
    db: &DatabaseConnection,
    service_id: i64,
) -> Result<Option<service::Model>> {
    Service::find_by_id(service_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every service with its checks and regexes, all in id order.
pub async fn list_service_details(db: &DatabaseConnection) -> Result<Vec<ServiceDetails>> {
    let services = list_services(db).await?;
    let checks = ServiceCheck::find()
        .order_by_asc(service_check::Column::Id)
        .all(db)
        .await?;
    let regexes = RegexCheck::find()
        .order_by_asc(regex_check::Column::Id)
        .all(db)
        .await?;

    Ok(services
        .into_iter()
        .map(|service| {
            let checks = checks
                .iter()
                .filter(|check| check.service_id == service.id)
                .map(|check| CheckDetails {
                    check: check.clone(),
                    regexes: regexes
                        .iter()
                        .filter(|regex| regex.service_check_id == check.id)
                        .cloned()
                        .collect(),
                })
                .collect();
            ServiceDetails { service, checks }
        })
        .collect())
}

fn validate(definition: &ServiceDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(Error::invalid("Service name cannot be empty"));
    }
    for check in &definition.checks {
        if check.name.trim().is_empty() || check.command.trim().is_empty() {
            return Err(Error::invalid(format!(
                "Check of service '{}' needs a name and a command",
                definition.name.trim()
            )));
        }
        if check.regexes.iter().any(|regex| regex.pattern.is_empty()) {
            return Err(Error::invalid(format!(
                "Check '{}' has an empty regex",
                check.name.trim()
            )));
        }
    }
    Ok(())
}

async fn delete_checks(txn: &DatabaseTransaction, service_id: i64) -> Result<()> {
    let check_ids: Vec<i64> = ServiceCheck::find()
        .filter(service_check::Column::ServiceId.eq(service_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|check| check.id)
        .collect();

    RegexCheck::delete_many()
        .filter(regex_check::Column::ServiceCheckId.is_in(check_ids))
        .exec(txn)
        .await?;
    ServiceCheck::delete_many()
        .filter(service_check::Column::ServiceId.eq(service_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Creates or updates a service, replacing all of its checks and regexes.
#[instrument(skip(db, definition), fields(name = %definition.name))]
pub async fn save_service(
    db: &DatabaseConnection,
    definition: ServiceDefinition,
) -> Result<ServiceDetails> {
    validate(&definition)?;
    let name = definition.name.trim().to_string();
    let description = definition
        .description
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let clash = Service::find()
        .filter(service::Column::Name.eq(name.as_str()))
        .one(db)
        .await?;
    if clash.is_some_and(|existing| Some(existing.id) != definition.id) {
        return Err(Error::Conflict {
            message: format!("Service '{name}' already exists"),
        });
    }

    let txn = db.begin().await?;

    let service = match definition.id {
        Some(id) => {
            let existing = Service::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| Error::not_found("Service", id))?;
            let mut active: service::ActiveModel = existing.into();
            active.name = Set(name);
            active.description = Set(description);
            let service = active.update(&txn).await?;
            delete_checks(&txn, service.id).await?;
            service
        }
        None => {
            service::ActiveModel {
                name: Set(name),
                description: Set(description),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let mut checks = Vec::with_capacity(definition.checks.len());
    for check in definition.checks {
        let stored = service_check::ActiveModel {
            service_id: Set(service.id),
            name: Set(check.name.trim().to_string()),
            command: Set(check.command.trim().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut regexes = Vec::with_capacity(check.regexes.len());
        for regex in check.regexes {
            let stored_regex = regex_check::ActiveModel {
                service_check_id: Set(stored.id),
                pattern: Set(regex.pattern),
                expected: Set(regex.expected),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            regexes.push(stored_regex);
        }
        checks.push(CheckDetails {
            check: stored,
            regexes,
        });
    }

    txn.commit().await?;

    info!(service_id = service.id, checks = checks.len(), "Saved service");
    Ok(ServiceDetails { service, checks })
}

/// Deletes a service with its checks and regexes, detaching any boxes.
///
/// Refused with a conflict once check records exist for the service.
#[instrument(skip(db))]
pub async fn delete_service(db: &DatabaseConnection, service_id: i64) -> Result<()> {
    let service = get_service_by_id(db, service_id)
        .await?
        .ok_or_else(|| Error::not_found("Service", service_id))?;

    let records = CompetitionService::find()
        .filter(competition_service::Column::ServiceId.eq(service_id))
        .count(db)
        .await?;
    if records > 0 {
        return Err(Error::Conflict {
            message: format!(
                "Service '{}' has check results; reset the competition first",
                service.name
            ),
        });
    }

    let txn = db.begin().await?;
    delete_checks(&txn, service_id).await?;
    ScoringBox::update_many()
        .col_expr(scoring_box::Column::ServiceId, Expr::value(Option::<i64>::None))
        .filter(scoring_box::Column::ServiceId.eq(service_id))
        .exec(&txn)
        .await?;
    Service::delete_by_id(service_id).exec(&txn).await?;
    txn.commit().await?;

    info!(service_id, "Deleted service {}", service.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn web_definition(id: Option<i64>) -> ServiceDefinition {
        ServiceDefinition {
            id,
            name: "web".to_string(),
            description: Some("nginx on .10".to_string()),
            checks: vec![CheckDefinition {
                name: "index".to_string(),
                command: "curl -s http://{ip}/".to_string(),
                regexes: vec![
                    RegexDefinition {
                        pattern: "Welcome".to_string(),
                        expected: true,
                    },
                    RegexDefinition {
                        pattern: "defaced".to_string(),
                        expected: false,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn test_save_service_with_checks() -> Result<()> {
        let db = setup_test_db().await?;

        let saved = save_service(&db, web_definition(None)).await?;

        assert_eq!(saved.service.name, "web");
        assert_eq!(saved.checks.len(), 1);
        assert_eq!(saved.checks[0].regexes.len(), 2);
        assert!(!saved.checks[0].regexes[1].expected);

        let listed = list_service_details(&db).await?;
        assert_eq!(listed, vec![saved]);

        Ok(())
    }

    #[tokio::test]
    async fn test_save_service_replaces_checks() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = save_service(&db, web_definition(None)).await?;

        let mut update = web_definition(Some(saved.service.id));
        update.checks = vec![CheckDefinition {
            name: "login".to_string(),
            command: "curl -s http://{ip}/login".to_string(),
            regexes: vec![],
        }];
        save_service(&db, update).await?;

        let listed = list_service_details(&db).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].checks.len(), 1);
        assert_eq!(listed[0].checks[0].check.name, "login");
        assert!(RegexCheck::find().all(&db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_save_service_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut blank = web_definition(None);
        blank.name = "  ".to_string();
        assert!(matches!(
            save_service(&db, blank).await,
            Err(Error::InvalidInput { .. })
        ));

        let mut no_command = web_definition(None);
        no_command.checks[0].command = String::new();
        assert!(matches!(
            save_service(&db, no_command).await,
            Err(Error::InvalidInput { .. })
        ));

        save_service(&db, web_definition(None)).await?;
        assert!(matches!(
            save_service(&db, web_definition(None)).await,
            Err(Error::Conflict { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_service_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let saved = save_service(&db, web_definition(None)).await?;
        crate::core::scoring_box::save_box(&db, None, team.id, "10.0.1.10", Some(saved.service.id))
            .await?;

        delete_service(&db, saved.service.id).await?;

        assert!(list_services(&db).await?.is_empty());
        assert!(ServiceCheck::find().all(&db).await?.is_empty());
        assert!(RegexCheck::find().all(&db).await?.is_empty());
        let boxes = crate::core::scoring_box::list_boxes(&db).await?;
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].service_id, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_service_with_records_is_refused() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Alpha").await?;
        let web = create_test_service(&db, "web").await?;
        create_test_check(&db, team.id, web.id, 1, true).await?;

        let result = delete_service(&db, web.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }
}
